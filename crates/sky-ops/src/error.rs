//! Error types for pixel operations.

use thiserror::Error;

/// Error type for pixel operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpsError {
    /// Buffer length does not match the stated dimensions, or a region is
    /// empty or out of bounds.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Two buffers have incompatible sizes or channel counts.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operation not supported for this channel layout.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Result type for pixel operations.
pub type OpsResult<T> = Result<T, OpsError>;

impl From<sky_core::Error> for OpsError {
    fn from(e: sky_core::Error) -> Self {
        OpsError::InvalidDimensions(e.to_string())
    }
}
