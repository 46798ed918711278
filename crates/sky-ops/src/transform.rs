//! Geometric transforms.
//!
//! # Operations
//!
//! - [`crop`] - extract a region
//! - [`flip_h`] / [`flip_v`] - mirrors
//! - [`transpose`] - swap the X and Y axes
//! - [`flip_swap`] - composable flips plus axis swap
//! - [`rotate`] - arbitrary angle, clipped or expanded canvas
//!
//! # Example
//!
//! ```rust
//! use sky_ops::transform::{crop, flip_h};
//!
//! let src = vec![0.5f32; 64 * 64 * 3];
//! let flipped = flip_h(&src, 64, 64, 3);
//! let cropped = crop(&flipped, 64, 64, 3, 16, 16, 32, 32).unwrap();
//! assert_eq!(cropped.len(), 32 * 32 * 3);
//! ```

use crate::rows::for_each_row;
use crate::{OpsError, OpsResult, check_dims};
use tracing::trace;

/// Crops a `w`x`h` region with top-left corner `(x, y)`.
///
/// # Example
///
/// ```rust
/// use sky_ops::transform::crop;
///
/// let src: Vec<f32> = (0..16).map(|v| v as f32).collect(); // 4x4 mono
/// let c = crop(&src, 4, 4, 1, 1, 1, 2, 2).unwrap();
/// assert_eq!(c, vec![5.0, 6.0, 9.0, 10.0]);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn crop(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    channels: usize,
    x: usize,
    y: usize,
    w: usize,
    h: usize,
) -> OpsResult<Vec<f32>> {
    check_dims(src, src_w, src_h, channels)?;
    if w == 0 || h == 0 || x + w > src_w || y + h > src_h {
        return Err(OpsError::InvalidDimensions(format!(
            "crop region {}x{} at ({},{}) outside {}x{}",
            w, h, x, y, src_w, src_h
        )));
    }

    let mut dst = Vec::with_capacity(w * h * channels);
    for row in y..(y + h) {
        let start = (row * src_w + x) * channels;
        dst.extend_from_slice(&src[start..start + w * channels]);
    }
    Ok(dst)
}

/// Mirrors left-right.
pub fn flip_h(src: &[f32], width: usize, height: usize, channels: usize) -> Vec<f32> {
    let mut dst = vec![0.0f32; src.len()];
    let row_len = width * channels;
    for_each_row(&mut dst, row_len, |y, row| {
        let src_row = &src[y * row_len..(y + 1) * row_len];
        for (x, px) in src_row.chunks_exact(channels).enumerate() {
            let d = (width - 1 - x) * channels;
            row[d..d + channels].copy_from_slice(px);
        }
    });
    dst
}

/// Mirrors top-bottom.
pub fn flip_v(src: &[f32], width: usize, height: usize, channels: usize) -> Vec<f32> {
    let mut dst = vec![0.0f32; src.len()];
    let row_len = width * channels;
    for_each_row(&mut dst, row_len, |y, row| {
        let s = (height - 1 - y) * row_len;
        row.copy_from_slice(&src[s..s + row_len]);
    });
    dst
}

/// Swaps the X and Y axes. The result is `height` wide and `width` tall.
///
/// ```rust
/// use sky_ops::transform::transpose;
///
/// // 3x1 -> 1x3
/// assert_eq!(transpose(&[1.0, 2.0, 3.0], 3, 1, 1), vec![1.0, 2.0, 3.0]);
/// // 2x2
/// assert_eq!(transpose(&[1.0, 2.0, 3.0, 4.0], 2, 2, 1), vec![1.0, 3.0, 2.0, 4.0]);
/// ```
pub fn transpose(src: &[f32], width: usize, height: usize, channels: usize) -> Vec<f32> {
    let mut dst = vec![0.0f32; src.len()];
    // output row y is input column y
    for_each_row(&mut dst, height * channels, |y, row| {
        for x in 0..height {
            let s = (x * width + y) * channels;
            row[x * channels..(x + 1) * channels].copy_from_slice(&src[s..s + channels]);
        }
    });
    dst
}

/// Applies flips, then the axis swap. Returns `(data, width, height)`.
pub fn flip_swap(
    src: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    flip_x: bool,
    flip_y: bool,
    swap_xy: bool,
) -> (Vec<f32>, usize, usize) {
    trace!(width, height, flip_x, flip_y, swap_xy, "flip_swap");
    let mut data = if flip_x { flip_h(src, width, height, channels) } else { src.to_vec() };
    if flip_y {
        data = flip_v(&data, width, height, channels);
    }
    if swap_xy {
        (transpose(&data, width, height, channels), height, width)
    } else {
        (data, width, height)
    }
}

/// Canvas size of a `width`x`height` image rotated by `deg`.
pub fn rotated_size(width: usize, height: usize, deg: f64) -> (usize, usize) {
    let (sin, cos) = deg.to_radians().sin_cos();
    let (w, h) = (width as f64, height as f64);
    // shave float noise so 90 degrees on 2x2 stays 2x2
    let fit = |v: f64| ((v - 1e-6).ceil() as usize).max(1);
    (fit(w * cos.abs() + h * sin.abs()), fit(w * sin.abs() + h * cos.abs()))
}

/// Rotates counter-clockwise as displayed (Y down) about the image center.
///
/// With `clip` the canvas keeps its size; otherwise it grows to hold the
/// whole rotated image. Uncovered pixels are set to `fill`. Sampling is
/// nearest-neighbor so data values are preserved. Returns
/// `(data, width, height)`.
///
/// # Example
///
/// ```rust
/// use sky_ops::transform::rotate;
///
/// let (dst, w, h) = rotate(&[1.0, 2.0, 3.0], 3, 1, 1, 90.0, false, 0.0).unwrap();
/// assert_eq!((w, h), (1, 3));
/// assert_eq!(dst, vec![3.0, 2.0, 1.0]);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn rotate(
    src: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    deg: f64,
    clip: bool,
    fill: f32,
) -> OpsResult<(Vec<f32>, usize, usize)> {
    check_dims(src, width, height, channels)?;
    if !deg.is_finite() {
        return Err(OpsError::InvalidParameter(format!("rotation angle {deg}")));
    }
    if deg.rem_euclid(360.0) == 0.0 {
        return Ok((src.to_vec(), width, height));
    }

    let (out_w, out_h) = if clip { (width, height) } else { rotated_size(width, height, deg) };
    trace!(width, height, deg, clip, out_w, out_h, "rotate");

    let (sin, cos) = deg.to_radians().sin_cos();
    let (icx, icy) = ((width as f64 - 1.0) / 2.0, (height as f64 - 1.0) / 2.0);
    let (ocx, ocy) = ((out_w as f64 - 1.0) / 2.0, (out_h as f64 - 1.0) / 2.0);

    let mut dst = vec![fill; out_w * out_h * channels];
    for_each_row(&mut dst, out_w * channels, |oy, row| {
        let dy = oy as f64 - ocy;
        for ox in 0..out_w {
            let dx = ox as f64 - ocx;
            let sx = (dx * cos - dy * sin + icx).round();
            let sy = (dx * sin + dy * cos + icy).round();
            if sx < 0.0 || sy < 0.0 || sx >= width as f64 || sy >= height as f64 {
                continue;
            }
            let s = (sy as usize * width + sx as usize) * channels;
            row[ox * channels..(ox + 1) * channels].copy_from_slice(&src[s..s + channels]);
        }
    });
    Ok((dst, out_w, out_h))
}
