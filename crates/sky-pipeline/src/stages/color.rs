//! Per-pixel color stages: channel mixer, white balance, sharpen.

use super::invalid;
use crate::{StageError, StageResult};
use serde::{Deserialize, Serialize};
use sky_core::{ChannelOrder, LUMA_WEIGHTS, PixelBuffer};
use sky_ops::color::{channel_mix, luma, white_balance};
use sky_ops::filter::sharpen;
use tracing::{debug, trace};

fn rgb_indices(src: &PixelBuffer, stage: &str) -> StageResult<[usize; 3]> {
    src.order.rgb_indices().ok_or_else(|| {
        StageError::Unsupported(format!("{stage} needs R, G and B channels, got {}", src.order))
    })
}

/// Weighted sum of R, G, B into one band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMixerParams {
    /// Weights for R, G, B.
    pub weights: [f32; 3],
}

impl Default for ChannelMixerParams {
    fn default() -> Self {
        Self { weights: LUMA_WEIGHTS }
    }
}

impl ChannelMixerParams {
    pub(crate) fn validate(&self) -> StageResult<()> {
        if self.weights.iter().any(|w| !w.is_finite()) {
            return Err(invalid(format!("mixer weights {:?}", self.weights)));
        }
        Ok(())
    }

    pub(crate) fn run(&self, src: &PixelBuffer) -> StageResult<PixelBuffer> {
        self.validate()?;
        if src.is_mono() {
            debug!("channel mixer on mono input, passing through");
            return Ok(src.clone());
        }
        let rgb = rgb_indices(src, "channel mixer")?;
        let data = channel_mix(&src.data, src.width, src.height, src.channels, rgb, self.weights)?;
        Ok(PixelBuffer::with_order(src.width, src.height, src.depth, ChannelOrder::mono(), data)?)
    }
}

/// Rescales each color channel so the reference color becomes neutral.
///
/// A pixel `p` becomes `p[c] * lum / reference[c]`, clipped to the
/// range of the input depth.
///
/// ```rust
/// use sky_pipeline::WhiteBalanceParams;
///
/// let mut wb = WhiteBalanceParams::from_reference([200.0, 100.0, 50.0]);
/// assert!((wb.lum - 124.2).abs() < 1e-3);
/// wb.set_lum(62.1);
/// let scaled = wb.scaled_reference();
/// assert!((scaled[0] - 100.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteBalanceParams {
    /// Picked reference color, `[r, g, b]`.
    pub reference: [f32; 3],
    /// Target luminance of the reference after balancing.
    pub lum: f32,
}

impl Default for WhiteBalanceParams {
    fn default() -> Self {
        Self::from_reference([1.0, 1.0, 1.0])
    }
}

impl WhiteBalanceParams {
    /// Balance against `rgb`, keeping its luminance.
    pub fn from_reference(rgb: [f32; 3]) -> Self {
        Self { reference: rgb, lum: luma(rgb, LUMA_WEIGHTS) }
    }

    /// Picks a new reference color and resets `lum` to its luminance.
    pub fn set_reference(&mut self, rgb: [f32; 3]) {
        *self = Self::from_reference(rgb);
    }

    /// Sets the target luminance. The stored reference is left as picked;
    /// [`Self::scaled_reference`] gives it rescaled to the new `lum`.
    pub fn set_lum(&mut self, lum: f32) {
        self.lum = lum;
    }

    /// The reference triplet rescaled proportionally so its luminance
    /// equals [`Self::lum`].
    pub fn scaled_reference(&self) -> [f32; 3] {
        let base = luma(self.reference, LUMA_WEIGHTS);
        if base == 0.0 {
            return self.reference;
        }
        self.reference.map(|c| c * self.lum / base)
    }

    /// Per-channel gains.
    pub fn gains(&self) -> [f32; 3] {
        self.reference.map(|r| self.lum / r)
    }

    pub(crate) fn validate(&self) -> StageResult<()> {
        if self.reference.iter().any(|&r| r == 0.0 || !r.is_finite()) {
            return Err(invalid(format!("white balance reference {:?}", self.reference)));
        }
        if !self.lum.is_finite() {
            return Err(invalid(format!("white balance lum {}", self.lum)));
        }
        Ok(())
    }

    pub(crate) fn run(&self, src: &PixelBuffer) -> StageResult<PixelBuffer> {
        self.validate()?;
        let rgb = rgb_indices(src, "white balance")?;
        let (lo, hi) = (src.depth.min_value(), src.depth.max_value());
        trace!(gains = ?self.gains(), "white balance");
        let data = white_balance(
            &src.data,
            src.width,
            src.height,
            src.channels,
            rgb,
            self.reference,
            self.lum,
            lo,
            hi,
        )?;
        Ok(src.like(data)?)
    }
}

/// Unsharp mask: median filter, then subtract `amount` times the
/// Laplacian. Alpha is not sharpened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpenParams {
    /// Median window, odd.
    pub size: usize,
    /// Laplacian weight.
    pub amount: f32,
}

impl Default for SharpenParams {
    fn default() -> Self {
        Self { size: 3, amount: 1.0 }
    }
}

impl SharpenParams {
    pub(crate) fn validate(&self) -> StageResult<()> {
        if self.size == 0 || self.size % 2 == 0 {
            return Err(invalid(format!("sharpen size {} must be odd", self.size)));
        }
        if !self.amount.is_finite() {
            return Err(invalid(format!("sharpen amount {}", self.amount)));
        }
        Ok(())
    }

    pub(crate) fn run(&self, src: &PixelBuffer) -> StageResult<PixelBuffer> {
        self.validate()?;
        let mut data =
            sharpen(&src.data, src.width, src.height, src.channels, self.size, self.amount)?;
        if let Some(a) = src.order.index_of('A') {
            let nc = src.channels;
            for (d, s) in data.chunks_exact_mut(nc).zip(src.data.chunks_exact(nc)) {
                d[a] = s[a];
            }
        }
        let mut out = src.like(data)?;
        out.clip_to_depth();
        Ok(out)
    }
}
