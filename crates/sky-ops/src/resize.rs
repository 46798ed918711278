//! Image resampling.
//!
//! Separable two-pass resize (horizontal then vertical) with a choice of
//! kernels. When downscaling the kernel is widened by the scale factor so
//! every source pixel contributes.
//!
//! # Filters
//!
//! - [`Filter::Nearest`] - no interpolation, keeps data values
//! - [`Filter::Bilinear`] - triangle kernel
//! - [`Filter::Bicubic`] - Mitchell-Netravali
//! - [`Filter::Lanczos3`] - windowed sinc
//!
//! # Example
//!
//! ```rust
//! use sky_ops::resize::{long_side_dims, resize_f32, Filter};
//!
//! let (w, h) = long_side_dims(64, 32, 128).unwrap();
//! assert_eq!((w, h), (128, 64));
//! let src = vec![0.0f32; 64 * 32];
//! let dst = resize_f32(&src, 64, 32, 1, w, h, Filter::Lanczos3).unwrap();
//! assert_eq!(dst.len(), 128 * 64);
//! ```

use crate::rows::for_each_row;
use crate::{OpsError, OpsResult, check_dims};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Resampling kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Nearest neighbor.
    Nearest,
    /// Linear interpolation.
    Bilinear,
    /// Cubic interpolation.
    #[default]
    Bicubic,
    /// Lanczos, three lobes.
    Lanczos3,
}

impl Filter {
    /// Registered names.
    pub const NAMES: [&'static str; 4] = ["nearest", "bilinear", "bicubic", "lanczos3"];

    /// Kernel by name.
    pub fn from_name(name: &str) -> OpsResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Filter::Nearest),
            "bilinear" => Ok(Filter::Bilinear),
            "bicubic" => Ok(Filter::Bicubic),
            "lanczos3" | "lanczos" => Ok(Filter::Lanczos3),
            _ => Err(OpsError::InvalidParameter(format!("unknown resize filter '{name}'"))),
        }
    }

    /// Support radius.
    #[inline]
    pub fn support(&self) -> f32 {
        match self {
            Filter::Nearest => 0.5,
            Filter::Bilinear => 1.0,
            Filter::Bicubic => 2.0,
            Filter::Lanczos3 => 3.0,
        }
    }

    /// Kernel weight at offset `x`.
    #[inline]
    pub fn weight(&self, x: f32) -> f32 {
        let ax = x.abs();
        match self {
            Filter::Nearest => {
                if ax < 0.5 { 1.0 } else { 0.0 }
            }
            Filter::Bilinear => (1.0 - ax).max(0.0),
            Filter::Bicubic => mitchell(ax),
            Filter::Lanczos3 => lanczos(ax, 3.0),
        }
    }
}

#[inline]
fn mitchell(ax: f32) -> f32 {
    const B: f32 = 1.0 / 3.0;
    const C: f32 = 1.0 / 3.0;
    if ax < 1.0 {
        ((12.0 - 9.0 * B - 6.0 * C) * ax * ax * ax
            + (-18.0 + 12.0 * B + 6.0 * C) * ax * ax
            + (6.0 - 2.0 * B))
            / 6.0
    } else if ax < 2.0 {
        ((-B - 6.0 * C) * ax * ax * ax
            + (6.0 * B + 30.0 * C) * ax * ax
            + (-12.0 * B - 48.0 * C) * ax
            + (8.0 * B + 24.0 * C))
            / 6.0
    } else {
        0.0
    }
}

#[inline]
fn lanczos(ax: f32, a: f32) -> f32 {
    if ax < 1e-8 {
        1.0
    } else if ax < a {
        let pi_x = std::f32::consts::PI * ax;
        let pi_x_a = pi_x / a;
        (pi_x.sin() / pi_x) * (pi_x_a.sin() / pi_x_a)
    } else {
        0.0
    }
}

/// Output size for scale factors `(sx, sy)`, at least one pixel each way.
pub fn scale_dims(width: usize, height: usize, sx: f64, sy: f64) -> OpsResult<(usize, usize)> {
    if !(sx > 0.0 && sy > 0.0 && sx.is_finite() && sy.is_finite()) {
        return Err(OpsError::InvalidParameter(format!("scale factors ({sx}, {sy})")));
    }
    let w = ((width as f64 * sx).round() as usize).max(1);
    let h = ((height as f64 * sy).round() as usize).max(1);
    Ok((w, h))
}

/// Aspect-preserving output size whose longer side is `long_side` pixels.
pub fn long_side_dims(width: usize, height: usize, long_side: usize) -> OpsResult<(usize, usize)> {
    if long_side == 0 || width == 0 || height == 0 {
        return Err(OpsError::InvalidDimensions(format!(
            "long side {long_side} for {width}x{height}"
        )));
    }
    let s = long_side as f64 / width.max(height) as f64;
    scale_dims(width, height, s, s)
}

/// Resizes interleaved `f32` data.
///
/// ```rust
/// use sky_ops::resize::{resize_f32, Filter};
///
/// let src = vec![0.5f32; 16 * 16 * 4];
/// let dst = resize_f32(&src, 16, 16, 4, 32, 32, Filter::Bilinear).unwrap();
/// assert!(dst.iter().all(|v| (v - 0.5).abs() < 1e-5));
/// ```
pub fn resize_f32(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    dst_h: usize,
    filter: Filter,
) -> OpsResult<Vec<f32>> {
    check_dims(src, src_w, src_h, channels)?;
    if dst_w == 0 || dst_h == 0 {
        return Err(OpsError::InvalidDimensions("destination size must be > 0".into()));
    }
    debug!(src_w, src_h, dst_w, dst_h, ?filter, "resize");
    if (src_w, src_h) == (dst_w, dst_h) {
        return Ok(src.to_vec());
    }

    let temp = resize_horizontal(src, src_w, src_h, channels, dst_w, filter);
    Ok(resize_vertical(&temp, dst_w, src_h, channels, dst_h, filter))
}

/// Source span and center for destination coordinate `d`.
#[inline]
fn footprint(d: usize, scale: f32, support: f32, len: usize) -> (f32, usize, usize) {
    let center = (d as f32 + 0.5) * scale - 0.5;
    let lo = ((center - support).floor().max(0.0)) as usize;
    let hi = ((center + support).ceil().max(0.0) as usize).min(len - 1);
    (center, lo, hi)
}

fn resize_horizontal(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_w: usize,
    filter: Filter,
) -> Vec<f32> {
    let mut dst = vec![0.0f32; dst_w * src_h * channels];
    let scale = src_w as f32 / dst_w as f32;
    let widen = scale.max(1.0);
    let support = filter.support() * widen;

    for_each_row(&mut dst, dst_w * channels, |y, row| {
        let mut sum = vec![0.0f32; channels];
        for x in 0..dst_w {
            let (center, left, right) = footprint(x, scale, support, src_w);
            sum.fill(0.0);
            let mut weight_sum = 0.0f32;
            for sx in left..=right {
                let w = filter.weight((sx as f32 - center) / widen);
                weight_sum += w;
                let s = (y * src_w + sx) * channels;
                for c in 0..channels {
                    sum[c] += src[s + c] * w;
                }
            }
            let out = &mut row[x * channels..(x + 1) * channels];
            if weight_sum > 0.0 {
                for c in 0..channels {
                    out[c] = sum[c] / weight_sum;
                }
            } else {
                let sx = (center.round().max(0.0) as usize).min(src_w - 1);
                let s = (y * src_w + sx) * channels;
                out.copy_from_slice(&src[s..s + channels]);
            }
        }
    });
    dst
}

fn resize_vertical(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    dst_h: usize,
    filter: Filter,
) -> Vec<f32> {
    let mut dst = vec![0.0f32; src_w * dst_h * channels];
    let scale = src_h as f32 / dst_h as f32;
    let widen = scale.max(1.0);
    let support = filter.support() * widen;
    let row_len = src_w * channels;

    for_each_row(&mut dst, row_len, |y, row| {
        let (center, top, bottom) = footprint(y, scale, support, src_h);
        let mut weight_sum = 0.0f32;
        for sy in top..=bottom {
            let w = filter.weight((sy as f32 - center) / widen);
            if w == 0.0 {
                continue;
            }
            weight_sum += w;
            let src_row = &src[sy * row_len..(sy + 1) * row_len];
            for (o, s) in row.iter_mut().zip(src_row) {
                *o += s * w;
            }
        }
        if weight_sum > 0.0 {
            let inv = 1.0 / weight_sum;
            row.iter_mut().for_each(|v| *v *= inv);
        } else {
            let sy = (center.round().max(0.0) as usize).min(src_h - 1);
            row.copy_from_slice(&src[sy * row_len..(sy + 1) * row_len]);
        }
    });
    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_upscale_keeps_values() {
        let src = vec![1.0, 2.0, 3.0, 4.0]; // 2x2
        let dst = resize_f32(&src, 2, 2, 1, 4, 4, Filter::Nearest).unwrap();
        assert_eq!(&dst[..4], &[1.0, 1.0, 2.0, 2.0]);
        assert_eq!(&dst[12..], &[3.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn test_downscale_averages() {
        let src = vec![0.0, 1.0, 0.0, 1.0];
        let dst = resize_f32(&src, 4, 1, 1, 2, 1, Filter::Bilinear).unwrap();
        for v in dst {
            assert!(v > 0.2 && v < 0.8);
        }
    }

    #[test]
    fn test_constant_preserved() {
        for filter in [Filter::Nearest, Filter::Bilinear, Filter::Bicubic, Filter::Lanczos3] {
            let src = vec![3.0f32; 7 * 5 * 3];
            let dst = resize_f32(&src, 7, 5, 3, 3, 11, filter).unwrap();
            assert_eq!(dst.len(), 3 * 11 * 3);
            assert!(dst.iter().all(|v| (v - 3.0).abs() < 1e-4), "{filter:?}");
        }
    }

    #[test]
    fn test_bad_sizes() {
        assert!(resize_f32(&[0.0; 4], 2, 2, 1, 0, 2, Filter::Nearest).is_err());
        assert!(resize_f32(&[0.0; 3], 2, 2, 1, 2, 2, Filter::Nearest).is_err());
    }

    #[test]
    fn test_dims_helpers() {
        assert_eq!(scale_dims(100, 50, 0.5, 2.0).unwrap(), (50, 100));
        assert_eq!(scale_dims(3, 3, 0.01, 0.01).unwrap(), (1, 1));
        assert!(scale_dims(3, 3, 0.0, 1.0).is_err());
        assert_eq!(long_side_dims(30, 60, 120).unwrap(), (60, 120));
    }

    #[test]
    fn test_filter_names() {
        for name in Filter::NAMES {
            assert!(Filter::from_name(name).is_ok());
        }
        assert!(Filter::from_name("sinc").is_err());
    }
}
