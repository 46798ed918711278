//! Error types for cut-level computation.

use thiserror::Error;

/// Error type for auto-cut algorithms.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AutoCutsError {
    /// A tunable is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input data has the wrong shape or is empty.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No algorithm is registered under this name.
    #[error("unknown autocuts algorithm: {0}")]
    UnknownAlgorithm(String),
}

/// Result type for auto-cut algorithms.
pub type AutoCutsResult<T> = Result<T, AutoCutsError>;

impl From<sky_core::Error> for AutoCutsError {
    fn from(err: sky_core::Error) -> Self {
        AutoCutsError::InvalidInput(err.to_string())
    }
}
