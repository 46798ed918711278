//! Error types for color mapping.

use thiserror::Error;

/// Error type for distributions, maps and the RGB mapper.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CmapError {
    /// Hash size outside `[colorlen, maxhashsize]`.
    #[error("hash size {size} outside [{min}, {max}]")]
    InvalidHashSize {
        /// Requested size
        size: usize,
        /// Smallest allowed size (the color length)
        min: usize,
        /// Largest allowed size
        max: usize,
    },

    /// Single-value lookup past the end of a table.
    #[error("index {index} out of range 0..{len}")]
    IndexOutOfRange {
        /// Requested index
        index: i64,
        /// Table length
        len: usize,
    },

    /// No color map, intensity map or distribution under this name.
    #[error("unknown {kind}: {name}")]
    UnknownMap {
        /// "color map", "intensity map" or "distribution"
        kind: &'static str,
        /// Requested name
        name: String,
    },

    /// Table data is empty, has the wrong length or values outside `[0, 1]`.
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// Output channel order lacks R, G or B.
    #[error("invalid channel order: {0}")]
    InvalidOrder(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for color mapping.
pub type CmapResult<T> = Result<T, CmapError>;
