//! Alpha compositing of overlays onto a canvas.
//!
//! Alpha is straight (not premultiplied) and, when present, is the last
//! channel. Buffers with 1 or 3 channels are opaque; 2 or 4 channels carry
//! alpha.
//!
//! # Example
//!
//! ```rust
//! use sky_ops::composite::{over_at, Placement};
//!
//! let mut canvas = vec![0.0f32; 4 * 4 * 3];
//! let dot = vec![255.0, 0.0, 0.0, 255.0]; // 1x1 opaque red, RGBA
//! let at = Placement { x: 2, y: 1, opacity: 1.0, alpha_max: 255.0 };
//! over_at(&mut canvas, 4, 4, 3, &dot, 1, 1, 4, at).unwrap();
//! assert_eq!(&canvas[(1 * 4 + 2) * 3..][..3], &[255.0, 0.0, 0.0]);
//! ```

use crate::{OpsError, OpsResult, check_dims};
use tracing::trace;

/// Straight-alpha over of two RGBA pixels with alpha in `[0, 1]`.
///
/// ```rust
/// use sky_ops::composite::over_pixel;
///
/// let out = over_pixel([1.0, 0.0, 0.0, 0.5], [0.0, 0.0, 1.0, 1.0]);
/// assert_eq!(out, [0.5, 0.0, 0.5, 1.0]);
/// ```
#[inline]
pub fn over_pixel(fg: [f32; 4], bg: [f32; 4]) -> [f32; 4] {
    let fg_a = fg[3];
    let bg_a = bg[3];
    let out_a = fg_a + bg_a * (1.0 - fg_a);
    if out_a < 1e-8 {
        return [0.0; 4];
    }
    let inv = 1.0 / out_a;
    [
        (fg[0] * fg_a + bg[0] * bg_a * (1.0 - fg_a)) * inv,
        (fg[1] * fg_a + bg[1] * bg_a * (1.0 - fg_a)) * inv,
        (fg[2] * fg_a + bg[2] * bg_a * (1.0 - fg_a)) * inv,
        out_a,
    ]
}

/// Where and how to place an overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge on the canvas; may be negative.
    pub x: i64,
    /// Top edge on the canvas; may be negative.
    pub y: i64,
    /// Global opacity multiplier, `[0, 1]`.
    pub opacity: f32,
    /// Value of a fully opaque alpha sample (255 for 8-bit data).
    pub alpha_max: f32,
}

fn split(channels: usize) -> OpsResult<(usize, bool)> {
    match channels {
        1 | 3 => Ok((channels, false)),
        2 | 4 => Ok((channels - 1, true)),
        _ => Err(OpsError::Unsupported(format!("{channels}-channel compositing"))),
    }
}

/// Composites `src` over `dst` in place at `at`, clipped to the canvas.
///
/// `src` must have the same number of color channels as `dst`, or a
/// single gray channel which is broadcast.
#[allow(clippy::too_many_arguments)]
pub fn over_at(
    dst: &mut [f32],
    dw: usize,
    dh: usize,
    dc: usize,
    src: &[f32],
    sw: usize,
    sh: usize,
    sc: usize,
    at: Placement,
) -> OpsResult<()> {
    check_dims(dst, dw, dh, dc)?;
    check_dims(src, sw, sh, sc)?;
    let (d_color, d_alpha) = split(dc)?;
    let (s_color, s_alpha) = split(sc)?;
    if s_color != d_color && s_color != 1 {
        return Err(OpsError::SizeMismatch(format!(
            "overlay has {s_color} color channels, canvas has {d_color}"
        )));
    }
    if !(at.alpha_max > 0.0) {
        return Err(OpsError::InvalidParameter(format!("alpha_max {}", at.alpha_max)));
    }
    let opacity = at.opacity.clamp(0.0, 1.0);

    let x0 = at.x.max(0);
    let y0 = at.y.max(0);
    let x1 = (at.x + sw as i64).min(dw as i64);
    let y1 = (at.y + sh as i64).min(dh as i64);
    trace!(x0, y0, x1, y1, opacity, "over_at");
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    for y in y0..y1 {
        let sy = (y - at.y) as usize;
        for x in x0..x1 {
            let sx = (x - at.x) as usize;
            let s = &src[(sy * sw + sx) * sc..][..sc];
            let d = &mut dst[(y as usize * dw + x as usize) * dc..][..dc];

            let fa = opacity * if s_alpha { s[sc - 1] / at.alpha_max } else { 1.0 };
            let ba = if d_alpha { d[dc - 1] / at.alpha_max } else { 1.0 };
            let out_a = fa + ba * (1.0 - fa);
            if out_a < 1e-8 {
                continue;
            }
            for c in 0..d_color {
                let fv = if s_color == 1 { s[0] } else { s[c] };
                d[c] = (fv * fa + d[c] * ba * (1.0 - fa)) / out_a;
            }
            if d_alpha {
                d[dc - 1] = out_a * at.alpha_max;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn place(x: i64, y: i64, opacity: f32) -> Placement {
        Placement { x, y, opacity, alpha_max: 1.0 }
    }

    #[test]
    fn test_over_pixel_transparent() {
        assert_eq!(over_pixel([1.0, 1.0, 1.0, 0.0], [0.2, 0.3, 0.4, 1.0]), [0.2, 0.3, 0.4, 1.0]);
        assert_eq!(over_pixel([1.0; 4], [0.0; 4]), [1.0; 4]);
    }

    #[test]
    fn test_over_at_clips_negative_offset() {
        let mut canvas = vec![0.0f32; 3 * 3];
        let patch = vec![1.0f32; 2 * 2];
        over_at(&mut canvas, 3, 3, 1, &patch, 2, 2, 1, place(-1, -1, 1.0)).unwrap();
        assert_eq!(canvas, vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_over_at_outside_is_noop() {
        let mut canvas = vec![0.0f32; 4];
        over_at(&mut canvas, 2, 2, 1, &[1.0], 1, 1, 1, place(5, 5, 1.0)).unwrap();
        assert_eq!(canvas, vec![0.0; 4]);
    }

    #[test]
    fn test_opacity_blends() {
        let mut canvas = vec![0.0f32; 3];
        over_at(&mut canvas, 1, 1, 3, &[1.0], 1, 1, 1, place(0, 0, 0.25)).unwrap();
        for v in canvas {
            assert_relative_eq!(v, 0.25);
        }
    }

    #[test]
    fn test_canvas_alpha_updated() {
        let mut canvas = vec![0.0f32, 0.0, 0.0, 0.0];
        over_at(&mut canvas, 1, 1, 4, &[1.0, 0.0, 0.0, 0.5], 1, 1, 4, place(0, 0, 1.0)).unwrap();
        assert_relative_eq!(canvas[0], 1.0);
        assert_relative_eq!(canvas[3], 0.5);
    }

    #[test]
    fn test_channel_mismatch() {
        let mut canvas = vec![0.0f32; 3];
        assert!(over_at(&mut canvas, 1, 1, 3, &[0.0; 2], 1, 1, 2, place(0, 0, 1.0)).is_ok());
        assert!(matches!(
            over_at(&mut canvas, 1, 1, 3, &[0.0; 5], 1, 1, 5, place(0, 0, 1.0)),
            Err(OpsError::Unsupported(_))
        ));
    }
}
