//! Error types for the acquisition pipeline.

use std::path::PathBuf;

use stacchip_cloud::CloudError;
use thiserror::Error;

/// Errors that abort a whole request.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("geometry error: {0}")]
    Geometry(#[from] stacchip_core::Error),

    #[error("invalid catalog query: {0}")]
    InvalidQuery(String),

    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[source] CloudError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<CloudError> for PipelineError {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::InvalidQuery(msg) => PipelineError::InvalidQuery(msg),
            other => PipelineError::CatalogUnavailable(other),
        }
    }
}

/// Errors isolated to a single asset of the chosen scene.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("asset '{key}' not found in scene '{scene}'")]
    AssetNotFound { scene: String, key: String },

    #[error("could not authorize asset '{key}': {source}")]
    Authorization {
        key: String,
        #[source]
        source: CloudError,
    },

    #[error("warp failed with {status}: {stderr}")]
    Retrieval { status: String, stderr: String },

    #[error("could not run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for request-level operations
pub type Result<T> = std::result::Result<T, PipelineError>;
