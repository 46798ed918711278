//! Sample depth of a pixel buffer.
//!
//! All buffers store samples as `f32`; [`BitDepth`] records the nominal
//! storage type the values came from (or are destined for) so stages know
//! which range to clip to.

use serde::{Deserialize, Serialize};

/// Nominal sample type of a [`PixelBuffer`](crate::PixelBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitDepth {
    /// 8-bit unsigned integer samples, range `[0, 255]`.
    U8,
    /// 16-bit unsigned integer samples, range `[0, 65535]`.
    U16,
    /// 32-bit float samples, effectively unbounded.
    #[default]
    F32,
}

impl BitDepth {
    /// Returns the depth matching a display bit-per-pixel setting.
    ///
    /// `8` maps to [`BitDepth::U8`], anything else to [`BitDepth::U16`].
    pub fn from_bpp(bpp: u32) -> Self {
        if bpp <= 8 { BitDepth::U8 } else { BitDepth::U16 }
    }

    /// Largest representable value.
    pub fn max_value(self) -> f32 {
        match self {
            BitDepth::U8 => 255.0,
            BitDepth::U16 => 65535.0,
            BitDepth::F32 => f32::MAX,
        }
    }

    /// Smallest representable value.
    pub fn min_value(self) -> f32 {
        match self {
            BitDepth::U8 | BitDepth::U16 => 0.0,
            BitDepth::F32 => f32::MIN,
        }
    }

    /// Returns `true` for integer storage types.
    pub fn is_integer(self) -> bool {
        !matches!(self, BitDepth::F32)
    }

    /// Clips a value into this depth's range.
    ///
    /// Integer depths also round to the nearest integer.
    ///
    /// ```rust
    /// use sky_core::BitDepth;
    ///
    /// assert_eq!(BitDepth::U8.clip(300.4), 255.0);
    /// assert_eq!(BitDepth::U8.clip(12.6), 13.0);
    /// assert_eq!(BitDepth::F32.clip(-4.5), -4.5);
    /// ```
    pub fn clip(self, v: f32) -> f32 {
        match self {
            BitDepth::F32 => v,
            _ => {
                if v.is_nan() {
                    return 0.0;
                }
                v.round().clamp(self.min_value(), self.max_value())
            }
        }
    }

    /// Value used to normalize samples into `[0, 1]` for color-managed
    /// operations. Float data is assumed to already be normalized.
    pub fn norm(self) -> f32 {
        match self {
            BitDepth::F32 => 1.0,
            _ => self.max_value(),
        }
    }
}
