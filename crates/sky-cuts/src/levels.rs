//! Applying cut levels to data.
//!
//! # Example
//!
//! ```rust
//! use sky_cuts::levels::cut_levels;
//!
//! let out = cut_levels(&[0.0, 500.0, 1000.0], 0.0, 1000.0, 0.0, 255.0);
//! assert_eq!(out[0], 0.0);
//! assert!((out[1] - 127.5).abs() < 1e-3);
//! assert_eq!(out[2], 255.0);
//! ```

use tracing::trace;

/// Linearly rescales `data` clipped to `[lo, hi]` into `[vmin, vmax]`.
///
/// When `hi <= lo` the result is a step: `vmin` below `lo`, `vmax` at or
/// above it. NaN samples map to `vmin`.
pub fn cut_levels(data: &[f32], lo: f64, hi: f64, vmin: f64, vmax: f64) -> Vec<f32> {
    trace!(len = data.len(), lo, hi, vmin, vmax, "cut_levels");
    let hi = hi.max(lo);
    let span = hi - lo;
    let out_span = vmax - vmin;
    data.iter()
        .map(|&v| {
            let v = v as f64;
            if v.is_nan() {
                return vmin as f32;
            }
            if span <= 0.0 {
                return if v < lo { vmin as f32 } else { vmax as f32 };
            }
            let t = ((v - lo) / span).clamp(0.0, 1.0);
            (vmin + t * out_span) as f32
        })
        .collect()
}

/// Clamps `data` into `[vmin, vmax]` without rescaling. NaN maps to `vmin`.
pub fn clip_levels(data: &[f32], vmin: f64, vmax: f64) -> Vec<f32> {
    let (vmin, vmax) = (vmin as f32, vmax as f32);
    data.iter()
        .map(|&v| if v.is_nan() { vmin } else { v.clamp(vmin, vmax) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_and_monotonic() {
        let data: Vec<f32> = (-50..150).map(|v| v as f32 * 7.3).collect();
        let out = cut_levels(&data, 10.0, 500.0, 0.0, 255.0);
        for w in out.windows(2) {
            assert!(w[1] >= w[0]);
        }
        assert!(out.iter().all(|&v| (0.0..=255.0).contains(&v)));
    }

    #[test]
    fn test_step_when_equal() {
        let out = cut_levels(&[1.0, 4.999, 5.0, 9.0], 5.0, 5.0, 0.0, 255.0);
        assert_eq!(out, vec![0.0, 0.0, 255.0, 255.0]);
    }

    #[test]
    fn test_reversed_levels_act_as_step() {
        let out = cut_levels(&[1.0, 9.0], 5.0, 2.0, 0.0, 10.0);
        assert_eq!(out, vec![0.0, 10.0]);
    }

    #[test]
    fn test_nan_maps_to_vmin() {
        let out = cut_levels(&[f32::NAN], 0.0, 1.0, 3.0, 10.0);
        assert_eq!(out, vec![3.0]);
    }

    #[test]
    fn test_clip_levels() {
        assert_eq!(clip_levels(&[-1.0, 0.5, 300.0], 0.0, 255.0), vec![0.0, 0.5, 255.0]);
    }
}
