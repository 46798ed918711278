//! # sky-cmap
//!
//! Color mapping for astronomical image display.
//!
//! Scaled data indices become display RGB in four phases:
//!
//! - [`dist`] - distribution curve (linear, log, sqrt, histeq ...)
//! - [`shift`] - contrast and brightness as a shift array
//! - [`maps::IntensityMap`] - index remapping table
//! - [`maps::ColorMap`] - RGB table
//!
//! [`RgbMapper`] owns all four and folds them into a single lookup cache.
//!
//! # Example
//!
//! ```rust
//! use sky_core::PixelBuffer;
//! use sky_cmap::{maps::ColorMap, RgbMapper};
//!
//! let mut mapper = RgbMapper::new(8).unwrap();
//! mapper.set_cmap(ColorMap::builtin("heat").unwrap());
//!
//! let idx = PixelBuffer::mono(2, 1, vec![0.0, 65535.0]).unwrap();
//! let rgb = mapper.get_rgb_array(&idx, "RGB").unwrap();
//! assert_eq!(rgb.channels, 3);
//! assert_eq!(&rgb.data[..3], &[0.0, 0.0, 0.0]);
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` (default) - rayon for large gathers

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod dist;
mod error;
pub mod maps;
pub mod rgbmap;
pub mod shift;

pub use dist::{ColorDist, DistKind};
pub use error::{CmapError, CmapResult};
pub use maps::{ColorMap, IntensityMap};
pub use rgbmap::{MapperSettings, RgbMapper};
