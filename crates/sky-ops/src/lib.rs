//! # sky-ops
//!
//! Pixel operations on interleaved row-major `f32` buffers.
//!
//! Every operation takes `(src, width, height, channels)` and returns a
//! fresh buffer; inputs are never modified.
//!
//! # Modules
//!
//! - [`transform`] - crop, flips, transpose, arbitrary rotation
//! - [`resize`] - separable resampling
//! - [`filter`] - median, Laplacian, sharpen
//! - [`color`] - channel mixing, white balance
//! - [`composite`] - alpha-over placement
//!
//! # Example
//!
//! ```rust
//! use sky_ops::transform::flip_swap;
//! use sky_ops::resize::{resize_f32, Filter};
//!
//! let src = vec![0.5f32; 8 * 4];
//! let (dst, w, h) = flip_swap(&src, 8, 4, 1, true, false, true);
//! assert_eq!((w, h), (4, 8));
//! let big = resize_f32(&dst, w, h, 1, 8, 16, Filter::Bilinear).unwrap();
//! assert_eq!(big.len(), 8 * 16);
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` (default) - rayon over output rows

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod color;
pub mod composite;
mod error;
pub mod filter;
mod rows;
pub mod resize;
pub mod transform;

pub use error::{OpsError, OpsResult};
pub use resize::Filter;

/// Checks `src.len() == width * height * channels` and that none is zero.
pub(crate) fn check_dims(src: &[f32], width: usize, height: usize, channels: usize) -> OpsResult<()> {
    if width == 0 || height == 0 || channels == 0 {
        return Err(OpsError::InvalidDimensions(format!(
            "{width}x{height}x{channels} has a zero dimension"
        )));
    }
    let expected = width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| OpsError::InvalidDimensions("image dimensions overflow".into()))?;
    if src.len() != expected {
        return Err(OpsError::InvalidDimensions(format!(
            "expected {} samples, got {}",
            expected,
            src.len()
        )));
    }
    Ok(())
}
