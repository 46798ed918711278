//! # sky-core
//!
//! Core types for rendering astronomical images.
//!
//! - [`PixelBuffer`] - Interleaved `f32` pixels with shape, depth and order
//! - [`BitDepth`] - Nominal sample type, used for output clipping
//! - [`ChannelOrder`] - Per-channel meaning (`"RGB"`, `"BGRA"`, `"M"`)
//! - [`ImageSource`] - Read access to an image, implemented by hosts
//! - [`RenderTarget`] - Sink for rendered frames, with [`ViewerGeometry`]
//!
//! ## Crate Structure
//!
//! ```text
//! sky-core (this crate)
//!    ^
//!    +-- sky-cuts (cut levels)
//!    +-- sky-cmap (color distribution and mapping)
//!    +-- sky-ops (pixel operations)
//!    +-- sky-icc (ICC profiles)
//!    +-- sky-pipeline (stages and engine)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod depth;
pub mod error;
pub mod order;
pub mod source;
pub mod target;

pub use buffer::PixelBuffer;
pub use depth::BitDepth;
pub use error::{Error, Result};
pub use order::ChannelOrder;
pub use source::{Cutout, ImageSource};
pub use target::{RenderTarget, ViewerGeometry};

/// Rec.601 luma weights for R, G and B.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];
