//! # sky-icc
//!
//! ICC color management for the display end of the rendering pipeline,
//! built on Little CMS 2.
//!
//! - [`Profile`] - loaded or built ICC profile
//! - [`StandardProfile`] - sRGB, Display P3, Rec. 2020 ...
//! - [`ProfileRegistry`] - resolves profile names used in pipeline documents
//! - [`Transform`] - float RGB transform with optional soft-proofing and
//!   black-point compensation
//!
//! # Example
//!
//! ```rust
//! use sky_core::{BitDepth, PixelBuffer};
//! use sky_icc::{Intent, ProfileRegistry, Transform};
//!
//! let reg = ProfileRegistry::new();
//! let src = reg.get("srgb").unwrap();
//! let dst = reg.get("display-p3").unwrap();
//! let t = Transform::new(&src, &dst, Intent::RelativeColorimetric).unwrap();
//!
//! let mut buf = PixelBuffer::new(1, 1, 3, BitDepth::U8, vec![255.0, 0.0, 0.0]).unwrap();
//! t.apply_to(&mut buf).unwrap();
//! assert!(buf.data[0] <= 255.0);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod profile;
mod registry;
mod standard;
mod transform;

pub use error::{IccError, IccResult};
pub use profile::Profile;
pub use registry::ProfileRegistry;
pub use standard::StandardProfile;
pub use transform::{Proofing, Transform};

use serde::{Deserialize, Serialize};

/// Rendering intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Compress the source gamut into the destination.
    #[default]
    Perceptual,
    /// Clip out-of-gamut colors, map white to white.
    RelativeColorimetric,
    /// Favor saturation over accuracy.
    Saturation,
    /// Clip out-of-gamut colors, keep the source white.
    AbsoluteColorimetric,
}

impl From<Intent> for lcms2::Intent {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Perceptual => lcms2::Intent::Perceptual,
            Intent::RelativeColorimetric => lcms2::Intent::RelativeColorimetric,
            Intent::Saturation => lcms2::Intent::Saturation,
            Intent::AbsoluteColorimetric => lcms2::Intent::AbsoluteColorimetric,
        }
    }
}
