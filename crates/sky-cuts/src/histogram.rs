//! Percentile cut levels from a histogram.

use crate::params::{CROP_RADIUS, ParamKind, ParamSpec, ParamValue, USECROP, check_range};
use crate::{AutoCutsError, AutoCutsResult, CutLevels, check_input, crop_or_full, single_band, stats};
use serde::{Deserialize, Serialize};
use sky_core::{ImageSource, PixelBuffer};
use tracing::{debug, trace, warn};

/// Keeps the central `pct` fraction of pixels between the cut levels.
///
/// The histogram is searched from both ends for the bin where the cumulative
/// count first exceeds `total * (1 - pct) / 2`, and the level is interpolated
/// linearly inside that bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Histogram {
    /// Fraction of pixels kept, in `[0, 1]`.
    pub pct: f64,
    /// Number of histogram bins.
    pub numbins: usize,
    /// Restrict to a center crop.
    pub usecrop: bool,
    /// Half-size of the crop.
    pub crop_radius: usize,
}

impl Default for Histogram {
    fn default() -> Self {
        Self { pct: 0.999, numbins: 2048, usecrop: true, crop_radius: 512 }
    }
}

pub(crate) const PCT: ParamSpec = ParamSpec {
    name: "pct",
    kind: ParamKind::Float,
    default: ParamValue::Float(0.999),
    range: Some((0.0, 1.0)),
    description: "Fraction of pixels to keep between the cut levels",
};

pub(crate) const NUMBINS: ParamSpec = ParamSpec {
    name: "numbins",
    kind: ParamKind::Int,
    default: ParamValue::Int(2048),
    range: Some((1.0, 1.0e6)),
    description: "Number of histogram bins",
};

pub(crate) const PARAMS: &[ParamSpec] = &[USECROP, CROP_RADIUS, PCT, NUMBINS];

impl Histogram {
    fn calc_histogram(&self, data: &[f32]) -> (f64, f64) {
        let Some((fmin, fmax)) = stats::finite_minmax(data) else {
            warn!("histogram: no finite samples, using flat levels");
            return (0.0, 0.0);
        };
        let (fmin, fmax) = (fmin as f64, fmax as f64);
        if fmin == fmax {
            return (fmin, fmax);
        }
        let subst = 0.5 * (fmin + fmax);
        let numbins = self.numbins;
        let width = (fmax - fmin) / numbins as f64;

        let mut hist = vec![0u64; numbins];
        for &v in data {
            let v = if v.is_finite() { v as f64 } else { subst };
            let bin = (((v - fmin) / width) as usize).min(numbins - 1);
            hist[bin] += 1;
        }

        let total = data.len() as f64;
        let cutoff = (total * (1.0 - self.pct) / 2.0) as u64;
        trace!(numbins, cutoff, fmin, fmax, "calc_histogram");

        let mut lo = fmin;
        let mut cum = 0u64;
        for (i, &count) in hist.iter().enumerate() {
            if cum + count > cutoff {
                let frac = (cutoff - cum) as f64 / count as f64;
                lo = fmin + (i as f64 + frac) * width;
                break;
            }
            cum += count;
        }

        let mut hi = fmax;
        cum = 0;
        for (j, &count) in hist.iter().enumerate().rev() {
            if cum + count > cutoff {
                let frac = (cutoff - cum) as f64 / count as f64;
                hi = fmin + ((j + 1) as f64 - frac) * width;
                break;
            }
            cum += count;
        }

        if lo > hi {
            let mid = 0.5 * (lo + hi);
            return (mid, mid);
        }
        (lo, hi)
    }
}

impl CutLevels for Histogram {
    fn validate(&self) -> AutoCutsResult<()> {
        if !(0.0..=1.0).contains(&self.pct) {
            return Err(AutoCutsError::InvalidParameter(format!(
                "pct = {} outside [0, 1]",
                self.pct
            )));
        }
        check_range(&NUMBINS, self.numbins as f64)
    }

    fn calc_cut_levels(&self, image: &dyn ImageSource) -> AutoCutsResult<(f64, f64)> {
        let full = single_band(image.get_data());
        if self.usecrop {
            let crop = crop_or_full(&full, self.crop_radius);
            return self.calc_cuts_from_data(&crop);
        }
        self.calc_cuts_from_data(&full)
    }

    fn calc_cuts_from_data(&self, data: &PixelBuffer) -> AutoCutsResult<(f64, f64)> {
        self.validate()?;
        check_input(data)?;
        let (lo, hi) = self.calc_histogram(&data.data);
        debug!(pct = self.pct, lo, hi, "histogram cuts");
        Ok((lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize) -> PixelBuffer {
        PixelBuffer::mono(n, 1, (0..n).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn test_central_half() {
        let img = uniform(10_000);
        let algo = Histogram { pct: 0.5, usecrop: false, ..Default::default() };
        let (lo, hi) = algo.calc_cut_levels(&img).unwrap();
        let width = 9999.0 / 2048.0;
        let cutoff = 2500usize;
        assert!((lo - img.data[cutoff] as f64).abs() <= width, "lo = {lo}");
        assert!((hi - img.data[10_000 - 1 - cutoff] as f64).abs() <= width, "hi = {hi}");
    }

    #[test]
    fn test_nan_substituted() {
        let mut data: Vec<f32> = (0..1000).map(|v| v as f32).collect();
        data[10] = f32::NAN;
        data[20] = f32::INFINITY;
        let img = PixelBuffer::mono(1000, 1, data).unwrap();
        let (lo, hi) = Histogram { pct: 1.0, ..Default::default() }.calc_cuts_from_data(&img).unwrap();
        assert!(lo.is_finite() && hi.is_finite());
        assert!(lo >= 0.0 && hi <= 999.0);
    }

    #[test]
    fn test_single_value() {
        let img = PixelBuffer::mono(3, 3, vec![4.0; 9]).unwrap();
        assert_eq!(Histogram::default().calc_cuts_from_data(&img).unwrap(), (4.0, 4.0));
    }

    #[test]
    fn test_bad_pct() {
        let img = uniform(10);
        let algo = Histogram { pct: 1.5, ..Default::default() };
        assert!(matches!(algo.calc_cuts_from_data(&img), Err(AutoCutsError::InvalidParameter(_))));
    }

    #[test]
    fn test_crop_used() {
        // bright frame around a dim center
        let n = 64;
        let data: Vec<f32> = (0..n * n)
            .map(|i| {
                let (x, y) = (i % n, i / n);
                if (16..48).contains(&x) && (16..48).contains(&y) { (i % 7) as f32 } else { 1000.0 }
            })
            .collect();
        let img = PixelBuffer::mono(n, n, data).unwrap();
        let algo = Histogram { pct: 1.0, crop_radius: 8, ..Default::default() };
        let (_, hi) = algo.calc_cut_levels(&img).unwrap();
        assert!(hi <= 6.0);
    }
}
