//! Error types for stacchip geometry operations

use thiserror::Error;

/// Errors raised while building or interpreting geometries.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("No local projected CRS for point (lat={lat}, lon={lon}): outside UTM coverage")]
    NoLocalProjection { lat: f64, lon: f64 },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for geometry operations
pub type Result<T> = std::result::Result<T, Error>;
