//! ZScale cut levels.
//!
//! Both variants take up to `num_points` evenly strided finite samples,
//! sort them and fit a line to sample value against normalized rank while
//! iteratively rejecting outliers. The cut levels extend from the median
//! along the fitted slope, flattened by `contrast`:
//!
//! ```text
//! lo = max(zmin, median - (center - 1) * slope / contrast)
//! hi = min(zmax, median + (npix - center) * slope / contrast)
//! ```
//!
//! [`ZScale`] solves the normal equations directly and grows the rejection
//! mask around every rejected sample. [`ZScale2`] uses the shared
//! Levenberg-Marquardt solver in [`crate::lm`], which is serialized behind a
//! global lock.
//!
//! If fewer than half of the samples survive rejection, or the fit is
//! singular, the sample min/max is returned.

use crate::params::{CONTRAST, NUM_POINTS, ParamSpec, check_range};
use crate::{AutoCutsError, AutoCutsResult, CutLevels, check_input, lm, stats};
use serde::{Deserialize, Serialize};
use sky_core::PixelBuffer;
use tracing::{debug, warn};

const KREJ: f64 = 2.5;
const MAX_ITERATIONS: usize = 5;
const MIN_NPIXELS: usize = 5;
const MAX_REJECT: f64 = 0.5;

/// IRAF-style zscale with direct least squares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZScale {
    /// Slope divisor in `(0, 1]`.
    pub contrast: f64,
    /// Maximum number of samples.
    pub num_points: usize,
}

impl Default for ZScale {
    fn default() -> Self {
        Self { contrast: 0.25, num_points: 1000 }
    }
}

/// ZScale with a Levenberg-Marquardt fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZScale2 {
    /// Slope divisor in `(0, 1]`.
    pub contrast: f64,
    /// Maximum number of samples.
    pub num_points: usize,
}

impl Default for ZScale2 {
    fn default() -> Self {
        Self { contrast: 0.25, num_points: 1000 }
    }
}

pub(crate) const PARAMS: &[ParamSpec] = &[CONTRAST, NUM_POINTS];

fn validate(contrast: f64, num_points: usize) -> AutoCutsResult<()> {
    if !(contrast > 0.0 && contrast <= 1.0) {
        return Err(AutoCutsError::InvalidParameter(format!(
            "contrast = {contrast} outside (0, 1]"
        )));
    }
    check_range(&NUM_POINTS, num_points as f64)
}

/// Sorted sample summary shared by both fits.
struct Samples {
    values: Vec<f64>,
    zmin: f64,
    zmax: f64,
    median: f64,
    center: usize,
}

impl Samples {
    fn collect(data: &[f32], num_points: usize) -> Option<Self> {
        let mut s = stats::sample_finite(data, num_points);
        if s.is_empty() {
            return None;
        }
        stats::sort_samples(&mut s);
        let values: Vec<f64> = s.into_iter().map(f64::from).collect();
        let npix = values.len();
        let (center, median) = if npix % 2 == 1 {
            let c = (npix - 1) / 2;
            (c, values[c])
        } else {
            let c = npix / 2;
            (c, 0.5 * (values[c - 1] + values[c]))
        };
        Some(Self { zmin: values[0], zmax: values[npix - 1], values, median, center })
    }

    fn npix(&self) -> usize {
        self.values.len()
    }

    fn minpix(&self) -> usize {
        MIN_NPIXELS.max((self.npix() as f64 * MAX_REJECT) as usize)
    }

    fn xnorm(&self) -> (f64, Vec<f64>) {
        let xscale = 2.0 / (self.npix() - 1) as f64;
        let x = (0..self.npix()).map(|i| i as f64 * xscale - 1.0).collect();
        (xscale, x)
    }

    /// Cut levels from a slope per sample index.
    fn levels(&self, zslope: f64, contrast: f64) -> (f64, f64) {
        let zslope = zslope / contrast;
        let npix = self.npix() as f64;
        let center = self.center as f64;
        let lo = self.zmin.max(self.median - (center - 1.0) * zslope);
        let hi = self.zmax.min(self.median + (npix - center) * zslope);
        (lo, hi)
    }
}

/// Mean and sample standard deviation of the good residuals.
fn good_sigma(flat: &[f64], bad: &[bool]) -> (usize, f64) {
    let mut n = 0usize;
    let mut sum = 0.0;
    let mut sumsq = 0.0;
    for (&f, _) in flat.iter().zip(bad).filter(|(_, b)| !**b) {
        n += 1;
        sum += f;
        sumsq += f * f;
    }
    if n < 2 {
        return (n, 0.0);
    }
    let nf = n as f64;
    let var = sumsq / (nf - 1.0) - sum * sum / (nf * (nf - 1.0));
    (n, var.max(0.0).sqrt())
}

/// Marks every sample within `ngrow` of a rejected one as rejected.
fn grow_mask(bad: &mut [bool], ngrow: usize) {
    let rejected: Vec<usize> = bad.iter().enumerate().filter(|(_, b)| **b).map(|(i, _)| i).collect();
    let before = ngrow / 2;
    let after = ngrow - 1 - before;
    for i in rejected {
        let lo = i.saturating_sub(before);
        let hi = (i + after).min(bad.len() - 1);
        bad[lo..=hi].iter_mut().for_each(|b| *b = true);
    }
}

/// Iterative k-sigma line fit. Returns `(ngoodpix, zslope)` with the slope
/// per sample index, or `None` on a singular system.
fn fit_direct(s: &Samples) -> Option<(usize, f64)> {
    let npix = s.npix();
    let (xscale, x) = s.xnorm();
    let ngrow = 1.max((npix as f64 * 0.01) as usize);
    let minpix = s.minpix();

    let mut bad = vec![false; npix];
    let mut ngood = npix;
    let mut last_ngood = npix + 1;
    let mut slope = 0.0;

    for _ in 0..MAX_ITERATIONS {
        if ngood >= last_ngood || ngood < minpix {
            break;
        }
        let (mut sum, mut sumx, mut sumxx, mut sumy, mut sumxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for ((&xi, &yi), _) in x.iter().zip(&s.values).zip(&bad).filter(|(_, b)| !**b) {
            sum += 1.0;
            sumx += xi;
            sumxx += xi * xi;
            sumy += yi;
            sumxy += xi * yi;
        }
        let delta = sum * sumxx - sumx * sumx;
        if delta.abs() < f64::EPSILON {
            return None;
        }
        let intercept = (sumxx * sumy - sumx * sumxy) / delta;
        slope = (sum * sumxy - sumx * sumy) / delta;

        let flat: Vec<f64> =
            x.iter().zip(&s.values).map(|(&xi, &yi)| yi - (intercept + slope * xi)).collect();
        let (_, sigma) = good_sigma(&flat, &bad);
        let threshold = sigma * KREJ;
        for (b, f) in bad.iter_mut().zip(&flat) {
            if *f < -threshold || *f > threshold {
                *b = true;
            }
        }
        grow_mask(&mut bad, ngrow);
        last_ngood = ngood;
        ngood = bad.iter().filter(|b| !**b).count();
    }
    Some((ngood, slope * xscale))
}

/// Same rejection loop as [`fit_direct`] using the LM solver.
fn fit_lm(s: &Samples) -> Option<(usize, f64)> {
    let npix = s.npix();
    let (xscale, x) = s.xnorm();
    let minpix = s.minpix();
    let mut bad = vec![false; npix];
    let mut ngood = npix;
    let mut slope = None;

    for _ in 0..MAX_ITERATIONS {
        if ngood < minpix {
            break;
        }
        let (gx, gy): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(&s.values)
            .zip(&bad)
            .filter(|(_, b)| !**b)
            .map(|((&xi, &yi), _)| (xi, yi))
            .unzip();
        let fit = lm::fit_line(&gx, &gy)?;
        slope = Some(fit.slope);

        let flat: Vec<f64> = x
            .iter()
            .zip(&s.values)
            .map(|(&xi, &yi)| yi - (fit.intercept + fit.slope * xi))
            .collect();
        let (_, sigma) = good_sigma(&flat, &bad);
        let threshold = sigma * KREJ;
        let mut changed = false;
        for (b, f) in bad.iter_mut().zip(&flat) {
            if !*b && (*f < -threshold || *f > threshold) {
                *b = true;
                changed = true;
            }
        }
        ngood = bad.iter().filter(|b| !**b).count();
        if !changed {
            break;
        }
    }
    slope.map(|m| (ngood, m * xscale))
}

fn zscale_levels(
    data: &PixelBuffer,
    contrast: f64,
    num_points: usize,
    fit: fn(&Samples) -> Option<(usize, f64)>,
    name: &str,
) -> (f64, f64) {
    let Some(s) = Samples::collect(&data.data, num_points) else {
        warn!(algorithm = name, "no finite samples, using flat levels");
        return (0.0, 0.0);
    };
    if s.npix() < 2 {
        return (s.zmin, s.zmax);
    }
    match fit(&s) {
        Some((ngood, zslope)) if ngood >= s.minpix() => {
            let (lo, hi) = s.levels(zslope, contrast);
            debug!(algorithm = name, npix = s.npix(), ngood, zslope, lo, hi, "zscale fit");
            (lo, hi)
        }
        Some((ngood, _)) => {
            debug!(algorithm = name, ngood, minpix = s.minpix(), "too many rejected, using min/max");
            (s.zmin, s.zmax)
        }
        None => {
            warn!(algorithm = name, npix = s.npix(), "line fit failed, using min/max");
            (s.zmin, s.zmax)
        }
    }
}

impl CutLevels for ZScale {
    fn validate(&self) -> AutoCutsResult<()> {
        validate(self.contrast, self.num_points)
    }

    fn calc_cuts_from_data(&self, data: &PixelBuffer) -> AutoCutsResult<(f64, f64)> {
        self.validate()?;
        check_input(data)?;
        Ok(zscale_levels(data, self.contrast, self.num_points, fit_direct, "zscale"))
    }
}

impl CutLevels for ZScale2 {
    fn validate(&self) -> AutoCutsResult<()> {
        validate(self.contrast, self.num_points)
    }

    fn calc_cuts_from_data(&self, data: &PixelBuffer) -> AutoCutsResult<(f64, f64)> {
        self.validate()?;
        check_input(data)?;
        Ok(zscale_levels(data, self.contrast, self.num_points, fit_lm, "zscale2"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_sky(n: usize) -> PixelBuffer {
        // background ~100 with a few bright stars
        let mut seed = 12345u64;
        let data: Vec<f32> = (0..n * n)
            .map(|i| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let noise = ((seed >> 33) as f32 / (1u64 << 31) as f32) * 10.0 - 5.0;
                if i % 97 == 0 { 5000.0 } else { 100.0 + noise }
            })
            .collect();
        PixelBuffer::mono(n, n, data).unwrap()
    }

    #[test]
    fn test_zscale_ignores_stars() {
        let (lo, hi) = ZScale::default().calc_cuts_from_data(&noisy_sky(64)).unwrap();
        assert!(lo >= 90.0 && lo < 100.0, "lo = {lo}");
        assert!(hi > 100.0 && hi < 200.0, "hi = {hi}");
    }

    #[test]
    fn test_zscale2_ignores_stars() {
        let (lo, hi) = ZScale2::default().calc_cuts_from_data(&noisy_sky(64)).unwrap();
        assert!(lo >= 90.0 && lo < 100.0, "lo = {lo}");
        assert!(hi > 100.0 && hi < 200.0, "hi = {hi}");
    }

    #[test]
    fn test_flat_data() {
        let img = PixelBuffer::mono(8, 8, vec![7.0; 64]).unwrap();
        assert_eq!(ZScale::default().calc_cuts_from_data(&img).unwrap(), (7.0, 7.0));
        assert_eq!(ZScale2::default().calc_cuts_from_data(&img).unwrap(), (7.0, 7.0));
    }

    #[test]
    fn test_all_nan() {
        let img = PixelBuffer::mono(4, 4, vec![f32::NAN; 16]).unwrap();
        assert_eq!(ZScale::default().calc_cuts_from_data(&img).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn test_invalid_contrast() {
        let img = noisy_sky(8);
        let z = ZScale { contrast: 0.0, ..Default::default() };
        assert!(matches!(z.calc_cuts_from_data(&img), Err(AutoCutsError::InvalidParameter(_))));
        let z = ZScale2 { contrast: 1.5, ..Default::default() };
        assert!(z.calc_cuts_from_data(&img).is_err());
    }

    #[test]
    fn test_grow_mask() {
        let mut bad = vec![false; 7];
        bad[3] = true;
        grow_mask(&mut bad, 3);
        assert_eq!(bad, vec![false, false, true, true, true, false, false]);
    }
}
