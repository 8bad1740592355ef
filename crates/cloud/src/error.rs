//! Error types for catalog access.

use thiserror::Error;

/// Errors produced while querying a catalog or signing assets.
#[derive(Error, Debug)]
pub enum CloudError {
    /// Transport failure: connection refused, timeout, broken body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid catalog query: {0}")]
    InvalidQuery(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),
}

impl CloudError {
    /// Whether the catalog service itself failed (as opposed to a bad
    /// request built by the caller).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CloudError::Http(_) | CloudError::Network(_))
    }
}

/// Result alias for cloud operations.
pub type Result<T> = std::result::Result<T, CloudError>;
