//! Geometric stages: crop, rotate, scale, flip/swap.

use super::invalid;
use crate::{Blackboard, StageResult};
use serde::{Deserialize, Serialize};
use sky_core::PixelBuffer;
use sky_ops::Filter;
use sky_ops::resize::{long_side_dims, resize_f32, scale_dims};
use sky_ops::transform::{crop, flip_swap, rotate};
use tracing::{debug, trace};

/// Crop to a rectangle given in normalized `[0, 1]` coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropParams {
    /// Left edge.
    pub x1: f64,
    /// Top edge.
    pub y1: f64,
    /// Right edge.
    pub x2: f64,
    /// Bottom edge.
    pub y2: f64,
    /// Required width/height ratio in pixels. The rectangle is shrunk
    /// around its center to match.
    pub aspect: Option<f64>,
}

impl Default for CropParams {
    fn default() -> Self {
        Self { x1: 0.0, y1: 0.0, x2: 1.0, y2: 1.0, aspect: None }
    }
}

impl CropParams {
    pub(crate) fn validate(&self) -> StageResult<()> {
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if ![self.x1, self.y1, self.x2, self.y2].into_iter().all(in_unit) {
            return Err(invalid(format!(
                "crop rectangle ({}, {}, {}, {}) outside [0, 1]",
                self.x1, self.y1, self.x2, self.y2
            )));
        }
        if self.x1 >= self.x2 || self.y1 >= self.y2 {
            return Err(invalid("crop rectangle is empty"));
        }
        if let Some(a) = self.aspect {
            if !(a.is_finite() && a > 0.0) {
                return Err(invalid(format!("crop aspect {a}")));
            }
        }
        Ok(())
    }

    /// Pixel rectangle `(x, y, width, height)` for a `width x height`
    /// image, clamped so it is never empty.
    pub fn pixel_rect(&self, width: usize, height: usize) -> (usize, usize, usize, usize) {
        let (w, h) = (width as f64, height as f64);
        let (mut x1, mut y1, mut x2, mut y2) = (self.x1 * w, self.y1 * h, self.x2 * w, self.y2 * h);
        if let Some(aspect) = self.aspect {
            let (cw, ch) = (x2 - x1, y2 - y1);
            if cw / ch > aspect {
                let half = ch * aspect / 2.0;
                let cx = (x1 + x2) / 2.0;
                (x1, x2) = (cx - half, cx + half);
            } else {
                let half = cw / aspect / 2.0;
                let cy = (y1 + y2) / 2.0;
                (y1, y2) = (cy - half, cy + half);
            }
        }
        let px1 = (x1.round().max(0.0) as usize).min(width - 1);
        let py1 = (y1.round().max(0.0) as usize).min(height - 1);
        let px2 = (x2.round().max(0.0) as usize).clamp(px1 + 1, width);
        let py2 = (y2.round().max(0.0) as usize).clamp(py1 + 1, height);
        (px1, py1, px2 - px1, py2 - py1)
    }

    pub(crate) fn run(&self, src: &PixelBuffer, bb: &mut Blackboard) -> StageResult<PixelBuffer> {
        self.validate()?;
        let (x, y, w, h) = self.pixel_rect(src.width, src.height);
        debug!(x, y, width = w, height = h, "crop");
        let data = crop(&src.data, src.width, src.height, src.channels, x, y, w, h)?;
        bb.crop_offset = (x, y);
        Ok(PixelBuffer::with_order(w, h, src.depth, src.order.clone(), data)?)
    }
}

/// Rotate about the image center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateParams {
    /// Degrees, counter-clockwise as displayed.
    pub angle: f64,
    /// Keep the canvas size; otherwise grow it to hold the whole image.
    pub clip: bool,
    /// Append an opaque alpha channel first so padding is transparent.
    pub add_alpha: bool,
}

impl Default for RotateParams {
    fn default() -> Self {
        Self { angle: 0.0, clip: true, add_alpha: false }
    }
}

impl RotateParams {
    pub(crate) fn validate(&self) -> StageResult<()> {
        if !self.angle.is_finite() {
            return Err(invalid(format!("rotation angle {}", self.angle)));
        }
        Ok(())
    }

    pub(crate) fn run(&self, src: &PixelBuffer) -> StageResult<PixelBuffer> {
        self.validate()?;
        let with_alpha;
        let buf = if self.add_alpha && !src.order.has_alpha() {
            with_alpha = src.with_alpha(src.depth.norm());
            &with_alpha
        } else {
            src
        };
        trace!(angle = self.angle, clip = self.clip, channels = buf.channels, "rotate stage");
        let (data, w, h) =
            rotate(&buf.data, buf.width, buf.height, buf.channels, self.angle, self.clip, 0.0)?;
        Ok(PixelBuffer::with_order(w, h, buf.depth, buf.order.clone(), data)?)
    }
}

/// Output size of the scale stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScaleTarget {
    /// Independent X/Y factors.
    Factor {
        /// Horizontal factor.
        x: f64,
        /// Vertical factor.
        y: f64,
    },
    /// Longer side becomes `pixels`, aspect preserved.
    LongSide {
        /// Target length of the longer side.
        pixels: usize,
    },
}

impl Default for ScaleTarget {
    fn default() -> Self {
        ScaleTarget::Factor { x: 1.0, y: 1.0 }
    }
}

/// Resample.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleParams {
    /// Output size.
    pub target: ScaleTarget,
    /// Resampling kernel.
    pub method: Filter,
}

impl ScaleParams {
    pub(crate) fn validate(&self) -> StageResult<()> {
        match self.target {
            ScaleTarget::Factor { x, y } if !(x > 0.0 && y > 0.0 && x.is_finite() && y.is_finite()) => {
                Err(invalid(format!("scale factors ({x}, {y})")))
            }
            ScaleTarget::LongSide { pixels: 0 } => Err(invalid("long side must be > 0")),
            _ => Ok(()),
        }
    }

    /// Output size for a `width x height` input.
    pub fn output_size(&self, width: usize, height: usize) -> StageResult<(usize, usize)> {
        let dims = match self.target {
            ScaleTarget::Factor { x, y } => scale_dims(width, height, x, y)?,
            ScaleTarget::LongSide { pixels } => long_side_dims(width, height, pixels)?,
        };
        Ok(dims)
    }

    pub(crate) fn run(&self, src: &PixelBuffer) -> StageResult<PixelBuffer> {
        self.validate()?;
        let (w, h) = self.output_size(src.width, src.height)?;
        if (w, h) == (src.width, src.height) {
            return Ok(src.clone());
        }
        let data =
            resize_f32(&src.data, src.width, src.height, src.channels, w, h, self.method)?;
        let mut out = PixelBuffer::with_order(w, h, src.depth, src.order.clone(), data)?;
        // kernels with negative lobes overshoot
        out.clip_to_depth();
        Ok(out)
    }
}

/// Mirror and transpose. Flips are applied before the swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipSwapParams {
    /// Mirror left/right.
    pub flip_x: bool,
    /// Mirror top/bottom.
    pub flip_y: bool,
    /// Exchange X and Y.
    pub swap_xy: bool,
}

impl FlipSwapParams {
    pub(crate) fn run(&self, src: &PixelBuffer) -> StageResult<PixelBuffer> {
        let (data, w, h) = flip_swap(
            &src.data,
            src.width,
            src.height,
            src.channels,
            self.flip_x,
            self.flip_y,
            self.swap_xy,
        );
        Ok(PixelBuffer::with_order(w, h, src.depth, src.order.clone(), data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sky_core::{BitDepth, ChannelOrder};

    fn ramp(w: usize, h: usize) -> PixelBuffer {
        PixelBuffer::mono(w, h, (0..w * h).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn test_crop_records_offset() {
        let src = ramp(8, 8);
        let mut bb = Blackboard::default();
        let p = CropParams { x1: 0.25, y1: 0.5, x2: 0.75, y2: 1.0, aspect: None };
        let out = p.run(&src, &mut bb).unwrap();
        assert_eq!(out.size(), (4, 4));
        assert_eq!(bb.crop_offset, (2, 4));
        assert_eq!(out.data[0], 34.0);
    }

    #[test]
    fn test_crop_aspect_shrinks_around_center() {
        let p = CropParams { aspect: Some(1.0), ..Default::default() };
        assert_eq!(p.pixel_rect(100, 50), (25, 0, 50, 50));
        let p = CropParams { aspect: Some(2.0), ..Default::default() };
        assert_eq!(p.pixel_rect(100, 100), (0, 25, 100, 50));
    }

    #[test]
    fn test_crop_never_empty() {
        let p = CropParams { x1: 0.0, y1: 0.0, x2: 0.01, y2: 0.01, aspect: None };
        assert_eq!(p.pixel_rect(10, 10), (0, 0, 1, 1));
    }

    #[test]
    fn test_crop_rejects_inverted() {
        let p = CropParams { x1: 0.6, x2: 0.4, ..Default::default() };
        assert!(p.validate().is_err());
        let p = CropParams { x2: 1.5, ..Default::default() };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_rotate_add_alpha() {
        let src = PixelBuffer::filled(4, 4, BitDepth::U8, ChannelOrder::rgb(), 100.0).unwrap();
        let p = RotateParams { angle: 45.0, clip: false, add_alpha: true };
        let out = p.run(&src).unwrap();
        assert_eq!(out.order.as_str(), "RGBA");
        assert!(out.width > 4);
        // corners are padding: transparent
        assert_eq!(out.pixel(0, 0).unwrap()[3], 0.0);
        let (cx, cy) = (out.width / 2, out.height / 2);
        assert_eq!(out.pixel(cx, cy).unwrap()[3], 255.0);
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let src = ramp(5, 3);
        let out = RotateParams::default().run(&src).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_scale_long_side() {
        let src = ramp(40, 20);
        let p = ScaleParams { target: ScaleTarget::LongSide { pixels: 10 }, method: Filter::Bilinear };
        let out = p.run(&src).unwrap();
        assert_eq!(out.size(), (10, 5));
    }

    #[test]
    fn test_scale_clips_integer_overshoot() {
        let mut data = vec![0.0f32; 16];
        data[5] = 255.0;
        let src = PixelBuffer::new(4, 4, 1, BitDepth::U8, data).unwrap();
        let p = ScaleParams {
            target: ScaleTarget::Factor { x: 3.0, y: 3.0 },
            method: Filter::Lanczos3,
        };
        let out = p.run(&src).unwrap();
        assert!(out.data.iter().all(|&v| (0.0..=255.0).contains(&v)));
    }

    #[test]
    fn test_scale_yaml_shape() {
        let p: ScaleParams =
            serde_yaml::from_str("target: {mode: long_side, pixels: 512}\nmethod: lanczos3\n").unwrap();
        assert_eq!(p.target, ScaleTarget::LongSide { pixels: 512 });
        assert_eq!(p.method, Filter::Lanczos3);
        assert!(ScaleParams { target: ScaleTarget::Factor { x: 0.0, y: 1.0 }, ..Default::default() }
            .validate()
            .is_err());
    }

    #[test]
    fn test_flipswap() {
        let src = ramp(3, 2);
        let p = FlipSwapParams { flip_x: true, flip_y: false, swap_xy: true };
        let out = p.run(&src).unwrap();
        assert_eq!(out.size(), (2, 3));
        // flipped row 0 is [2, 1, 0]; transposed it becomes column 0
        assert_eq!(out.data, vec![2.0, 5.0, 1.0, 4.0, 0.0, 3.0]);
    }
}
