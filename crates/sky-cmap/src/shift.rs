//! Contrast and brightness as a shift array.
//!
//! The shift array is built from the identity `[0, 1, .., maxc]` in a fixed
//! order: stretch, pad, center crop, then roll. The order matters for
//! compatibility with existing viewer settings and must not change.

use tracing::trace;

/// Contrast percentage to stretch factor.
///
/// `i = clip(pct, 1e-4, 1)`, `scale = clip(1e-4 / i^3 + 1/i - 1, 0, maxc)`.
/// The curve is steep near 0 and flat near 1, so fine control lives at the
/// high end.
pub fn contrast_to_scale(pct: f64, maxc: f64) -> f64 {
    let i = pct.clamp(1e-4, 1.0);
    (1e-4 / (i * i * i) + 1.0 / i - 1.0).clamp(0.0, maxc)
}

/// Brightness percentage to a signed shift fraction in `[-1, 1]`.
pub fn brightness_to_shift(pct: f64) -> f64 {
    (1.0 - pct - 0.5) * 2.0
}

/// Entry `k` of the identity after stretching to `new` entries and padding
/// `m` edge values on both sides.
fn stretched_at(k: u64, len: u64, new: u64, m: u64) -> u32 {
    let maxc = len - 1;
    if k < m {
        return 0;
    }
    let j = k - m;
    if j >= new {
        return maxc as u32;
    }
    let iscale = len as f64 / new as f64;
    ((j as f64 * iscale) as u64).min(maxc) as u32
}

/// Circular shift by `num`, with the wrapped-in end clamped to the edge
/// value unless `rotate`.
fn roll(sarr: &[u32], num: i64, rotate: bool) -> Vec<u32> {
    let n = sarr.len();
    if n == 0 || num == 0 {
        return sarr.to_vec();
    }
    let k = num.rem_euclid(n as i64) as usize;
    let mut out = Vec::with_capacity(n);
    out.extend_from_slice(&sarr[n - k..]);
    out.extend_from_slice(&sarr[..n - k]);
    if !rotate {
        let m = (num.unsigned_abs() as usize).min(n);
        if num > 0 {
            out[..m].fill(sarr[0]);
        } else {
            out[n - m..].fill(sarr[n - 1]);
        }
    }
    out
}

/// Builds the shift array for a stretch factor and shift fraction.
///
/// ```rust
/// use sky_cmap::shift::{brightness_to_shift, contrast_to_scale, scale_and_shift};
///
/// let scale = contrast_to_scale(0.5, 255.0);
/// let shift = brightness_to_shift(0.5);
/// let sarr = scale_and_shift(256, scale, shift, false);
/// assert!(sarr.iter().enumerate().all(|(i, &v)| v == i as u32));
/// ```
pub fn scale_and_shift(len: usize, scale: f64, shift: f64, rotate: bool) -> Vec<u32> {
    if len == 0 {
        return Vec::new();
    }
    // the stretched ramp can be `len * maxc` long, so only the cropped
    // window is ever materialized
    let n = len as u64;
    let new = ((scale * n as f64).round() as u64).max(1);
    let m = if new < n { (n - new) / 2 + 1 } else { 0 };
    let start = (new + 2 * m) / 2 - n / 2;
    let sarr: Vec<u32> = (start..start + n).map(|k| stretched_at(k, n, new, m)).collect();

    let num = (len as f64 * shift).round() as i64;
    trace!(len, scale, shift, num, rotate, "scale_and_shift");
    roll(&sarr, num, rotate)
}

/// Shift array for contrast and brightness percentages.
///
/// Neutral contrast (exactly 0.5) stretches by exactly 1, so the default
/// settings give the identity at every bit depth.
///
/// ```rust
/// use sky_cmap::shift::shift_array;
///
/// let sarr = shift_array(65536, 0.5, 0.5, false);
/// assert!(sarr.iter().enumerate().all(|(i, &v)| v == i as u32));
/// ```
pub fn shift_array(len: usize, contrast: f64, brightness: f64, rotate: bool) -> Vec<u32> {
    let maxc = len.saturating_sub(1) as f64;
    let scale = if contrast == 0.5 { 1.0 } else { contrast_to_scale(contrast, maxc) };
    scale_and_shift(len, scale, brightness_to_shift(brightness), rotate)
}
