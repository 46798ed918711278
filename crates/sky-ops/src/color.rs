//! Per-pixel color operations.
//!
//! Channel positions are passed explicitly as `[r, g, b]` indices so the
//! operations work for any channel order (`RGB`, `BGRA`, ...).

use crate::rows::for_each_row;
use crate::{OpsError, OpsResult, check_dims};
use tracing::trace;

fn check_rgb(channels: usize, rgb: [usize; 3]) -> OpsResult<()> {
    if rgb.iter().any(|&i| i >= channels) {
        return Err(OpsError::Unsupported(format!(
            "channel indices {rgb:?} need a {}-channel image, got {channels}",
            rgb.iter().max().map_or(0, |m| m + 1)
        )));
    }
    Ok(())
}

/// Weighted sum of the three color channels.
#[inline]
pub fn luma(rgb: [f32; 3], weights: [f32; 3]) -> f32 {
    rgb[0] * weights[0] + rgb[1] * weights[1] + rgb[2] * weights[2]
}

/// Mixes the channels at `rgb` into a single band.
///
/// ```rust
/// use sky_ops::color::channel_mix;
///
/// let src = vec![10.0, 20.0, 30.0, 255.0]; // 1x1 RGBA
/// let out = channel_mix(&src, 1, 1, 4, [0, 1, 2], [0.5, 0.5, 0.0]).unwrap();
/// assert_eq!(out, vec![15.0]);
/// ```
pub fn channel_mix(
    src: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    rgb: [usize; 3],
    weights: [f32; 3],
) -> OpsResult<Vec<f32>> {
    check_dims(src, width, height, channels)?;
    check_rgb(channels, rgb)?;
    trace!(width, height, ?weights, "channel_mix");
    let mut dst = vec![0.0f32; width * height];
    for_each_row(&mut dst, width, |y, row| {
        let src_row = &src[y * width * channels..(y + 1) * width * channels];
        for (o, px) in row.iter_mut().zip(src_row.chunks_exact(channels)) {
            *o = luma([px[rgb[0]], px[rgb[1]], px[rgb[2]]], weights);
        }
    });
    Ok(dst)
}

/// Scales each color channel by `lum / reference[c]` and clips to
/// `[lo, hi]`. Other channels (alpha) pass through.
///
/// ```rust
/// use sky_ops::color::white_balance;
///
/// // reference pixel (200, 100, 50), target luminance 100
/// let src = vec![200.0, 100.0, 50.0];
/// let out = white_balance(&src, 1, 1, 3, [0, 1, 2], [200.0, 100.0, 50.0], 100.0, 0.0, 255.0)
///     .unwrap();
/// assert_eq!(out, vec![100.0, 100.0, 100.0]);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn white_balance(
    src: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    rgb: [usize; 3],
    reference: [f32; 3],
    lum: f32,
    lo: f32,
    hi: f32,
) -> OpsResult<Vec<f32>> {
    check_dims(src, width, height, channels)?;
    check_rgb(channels, rgb)?;
    if reference.iter().any(|&r| r == 0.0 || !r.is_finite()) {
        return Err(OpsError::InvalidParameter(format!(
            "white balance reference {reference:?} has a zero or non-finite component"
        )));
    }
    let gains = reference.map(|r| lum / r);
    trace!(width, height, ?gains, "white_balance");

    let mut dst = src.to_vec();
    for_each_row(&mut dst, width * channels, |_, row| {
        for px in row.chunks_exact_mut(channels) {
            for (k, &c) in rgb.iter().enumerate() {
                px[c] = (px[c] * gains[k]).clamp(lo, hi);
            }
        }
    });
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_mix_bgr() {
        let src = vec![30.0, 20.0, 10.0]; // BGR
        let out = channel_mix(&src, 1, 1, 3, [2, 1, 0], [1.0, 0.0, 0.0]).unwrap();
        assert_eq!(out, vec![10.0]);
    }

    #[test]
    fn test_channel_mix_needs_color() {
        assert!(matches!(
            channel_mix(&[1.0; 4], 2, 2, 1, [0, 1, 2], [0.3, 0.3, 0.4]),
            Err(OpsError::Unsupported(_))
        ));
    }

    #[test]
    fn test_white_balance_clips_and_keeps_alpha() {
        let src = vec![250.0, 10.0, 10.0, 128.0];
        let out =
            white_balance(&src, 1, 1, 4, [0, 1, 2], [100.0, 100.0, 100.0], 200.0, 0.0, 255.0).unwrap();
        assert_eq!(out, vec![255.0, 20.0, 20.0, 128.0]);
    }

    #[test]
    fn test_white_balance_zero_reference() {
        assert!(white_balance(&[1.0; 3], 1, 1, 3, [0, 1, 2], [0.0, 1.0, 1.0], 1.0, 0.0, 1.0).is_err());
    }
}
