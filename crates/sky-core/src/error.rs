//! Error types for sky-core operations.
//!
//! This module provides the error type shared by buffer construction,
//! channel-order parsing and image cutouts.
//!
//! # Usage
//!
//! ```rust
//! use sky_core::{Error, Result};
//!
//! fn check_pixel(x: usize, y: usize, width: usize, height: usize) -> Result<()> {
//!     if x >= width || y >= height {
//!         return Err(Error::OutOfBounds { x, y, width, height });
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Used By
//!
//! - [`crate::buffer::PixelBuffer`] - Construction and channel access
//! - [`crate::source::ImageSource`] - Cutout bounds checking
//! - `sky-pipeline` - Wrapped by stage errors

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or slicing pixel buffers.
///
/// # Categories
///
/// - **Bounds errors**: [`OutOfBounds`](Error::OutOfBounds), [`InvalidRegion`](Error::InvalidRegion)
/// - **Shape errors**: [`InvalidDimensions`](Error::InvalidDimensions), [`BufferSize`](Error::BufferSize),
///   [`ChannelMismatch`](Error::ChannelMismatch)
/// - **Order errors**: [`InvalidOrder`](Error::InvalidOrder)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Pixel coordinates are outside image bounds.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sky_core::Error;
    ///
    /// let err = Error::OutOfBounds { x: 100, y: 50, width: 80, height: 60 };
    /// assert!(err.to_string().contains("100"));
    /// ```
    #[error("pixel ({x}, {y}) out of bounds for image {width}x{height}")]
    OutOfBounds {
        /// X coordinate that was out of bounds
        x: usize,
        /// Y coordinate that was out of bounds
        y: usize,
        /// Image width
        width: usize,
        /// Image height
        height: usize,
    },

    /// A requested region is empty or reversed.
    ///
    /// Returned by cutouts when `x2 <= x1` or `y2 <= y1` after clamping
    /// to the image, or when a sampling step is zero.
    #[error("invalid region ({x1}, {y1})-({x2}, {y2}): {reason}")]
    InvalidRegion {
        /// Region left edge
        x1: usize,
        /// Region top edge
        y1: usize,
        /// Region right edge (exclusive)
        x2: usize,
        /// Region bottom edge (exclusive)
        y2: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Invalid image dimensions.
    ///
    /// Width, height or channel count is zero.
    #[error("invalid dimensions: {width}x{height}x{channels} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
        /// Requested channel count
        channels: usize,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Sample vector length does not match `width * height * channels`.
    #[error("buffer size mismatch: expected {expected} samples, got {got}")]
    BufferSize {
        /// Samples implied by the dimensions
        expected: usize,
        /// Samples actually provided
        got: usize,
    },

    /// Channel count mismatch between a buffer and an operation.
    #[error("channel mismatch: expected {expected}, got {got}")]
    ChannelMismatch {
        /// Expected channel count
        expected: usize,
        /// Actual channel count
        got: usize,
    },

    /// Channel order string is empty, has duplicates or disagrees with the
    /// channel count.
    #[error("invalid channel order '{order}': {reason}")]
    InvalidOrder {
        /// The offending order string
        order: String,
        /// Reason
        reason: String,
    },
}
