//! Neighborhood filters.
//!
//! All filters run per channel and replicate edge pixels outside the image.
//!
//! # Example
//!
//! ```rust
//! use sky_ops::filter::sharpen;
//!
//! let src = vec![0.5f32; 16 * 16 * 3];
//! let out = sharpen(&src, 16, 16, 3, 3, 1.0).unwrap();
//! assert!(out.iter().all(|v| (v - 0.5).abs() < 1e-6));
//! ```

use crate::rows::for_each_row;
use crate::{OpsError, OpsResult, check_dims};
use tracing::trace;

#[inline]
fn clamp_idx(v: isize, len: usize) -> usize {
    v.clamp(0, len as isize - 1) as usize
}

/// Median over a `size`x`size` window. `size` must be odd.
///
/// NaN samples sort last, so they only win when they fill more than half
/// the window.
///
/// ```rust
/// use sky_ops::filter::median;
///
/// let mut src = vec![1.0f32; 5 * 5];
/// src[12] = 100.0; // hot pixel
/// let out = median(&src, 5, 5, 1, 3).unwrap();
/// assert_eq!(out[12], 1.0);
/// ```
pub fn median(
    src: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    size: usize,
) -> OpsResult<Vec<f32>> {
    check_dims(src, width, height, channels)?;
    if size == 0 || size % 2 == 0 {
        return Err(OpsError::InvalidParameter(format!("median size {size} must be odd")));
    }
    trace!(width, height, channels, size, "median");
    if size == 1 {
        return Ok(src.to_vec());
    }

    let r = (size / 2) as isize;
    let mut dst = vec![0.0f32; src.len()];
    for_each_row(&mut dst, width * channels, |y, row| {
        let mut window = Vec::with_capacity(size * size);
        for x in 0..width {
            for c in 0..channels {
                window.clear();
                for dy in -r..=r {
                    let sy = clamp_idx(y as isize + dy, height);
                    for dx in -r..=r {
                        let sx = clamp_idx(x as isize + dx, width);
                        window.push(src[(sy * width + sx) * channels + c]);
                    }
                }
                let mid = window.len() / 2;
                let (_, m, _) = window.select_nth_unstable_by(mid, f32::total_cmp);
                row[x * channels + c] = *m;
            }
        }
    });
    Ok(dst)
}

/// Discrete Laplacian: sum of the four neighbors minus four times the
/// center.
pub fn laplacian(src: &[f32], width: usize, height: usize, channels: usize) -> OpsResult<Vec<f32>> {
    check_dims(src, width, height, channels)?;
    let mut dst = vec![0.0f32; src.len()];
    for_each_row(&mut dst, width * channels, |y, row| {
        let up = clamp_idx(y as isize - 1, height);
        let down = clamp_idx(y as isize + 1, height);
        for x in 0..width {
            let left = clamp_idx(x as isize - 1, width);
            let right = clamp_idx(x as isize + 1, width);
            for c in 0..channels {
                let at = |xx: usize, yy: usize| src[(yy * width + xx) * channels + c];
                row[x * channels + c] =
                    at(left, y) + at(right, y) + at(x, up) + at(x, down) - 4.0 * at(x, y);
            }
        }
    });
    Ok(dst)
}

/// Unsharp mask: `m - amount * laplacian(m)` where `m` is the
/// `size`-median of the input.
///
/// The result is not clipped.
pub fn sharpen(
    src: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    size: usize,
    amount: f32,
) -> OpsResult<Vec<f32>> {
    if !amount.is_finite() {
        return Err(OpsError::InvalidParameter(format!("sharpen amount {amount}")));
    }
    let blurred = median(src, width, height, channels, size)?;
    let edges = laplacian(&blurred, width, height, channels)?;
    Ok(blurred.iter().zip(&edges).map(|(b, e)| b - amount * e).collect())
}
