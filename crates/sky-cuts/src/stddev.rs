//! Cut levels at fixed multiples of the standard deviation.

use crate::params::{CROP_RADIUS, ParamKind, ParamSpec, ParamValue, USECROP, check_range};
use crate::{AutoCutsResult, CutLevels, check_input, crop_or_full, single_band, stats};
use serde::{Deserialize, Serialize};
use sky_core::{ImageSource, PixelBuffer};
use tracing::{debug, warn};

/// `lo/hi = mean + (hensa - 50) / 10 * sd`, NaN ignored.
///
/// The "hensa" values are deviation scores: 50 is the mean and every 10
/// points is one standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StdDev {
    /// Deviation score of the low cut.
    pub hensa_lo: f64,
    /// Deviation score of the high cut.
    pub hensa_hi: f64,
    /// Restrict to a center crop.
    pub usecrop: bool,
    /// Half-size of the crop.
    pub crop_radius: usize,
}

impl Default for StdDev {
    fn default() -> Self {
        Self { hensa_lo: 35.0, hensa_hi: 90.0, usecrop: true, crop_radius: 512 }
    }
}

const HENSA_LO: ParamSpec = ParamSpec {
    name: "hensa_lo",
    kind: ParamKind::Float,
    default: ParamValue::Float(35.0),
    range: Some((0.0, 100.0)),
    description: "Low subtraction factor (deviation score)",
};

const HENSA_HI: ParamSpec = ParamSpec {
    name: "hensa_hi",
    kind: ParamKind::Float,
    default: ParamValue::Float(90.0),
    range: Some((0.0, 100.0)),
    description: "High subtraction factor (deviation score)",
};

pub(crate) const PARAMS: &[ParamSpec] = &[USECROP, CROP_RADIUS, HENSA_LO, HENSA_HI];

impl CutLevels for StdDev {
    fn validate(&self) -> AutoCutsResult<()> {
        check_range(&HENSA_LO, self.hensa_lo)?;
        check_range(&HENSA_HI, self.hensa_hi)
    }

    fn calc_cut_levels(&self, image: &dyn ImageSource) -> AutoCutsResult<(f64, f64)> {
        let full = single_band(image.get_data());
        if self.usecrop {
            return self.calc_cuts_from_data(&crop_or_full(&full, self.crop_radius));
        }
        self.calc_cuts_from_data(&full)
    }

    fn calc_cuts_from_data(&self, data: &PixelBuffer) -> AutoCutsResult<(f64, f64)> {
        self.validate()?;
        check_input(data)?;
        let Some((mean, sd)) = stats::mean_std(&data.data) else {
            warn!("stddev: no finite samples, using flat levels");
            return Ok((0.0, 0.0));
        };
        let lo = mean + (self.hensa_lo - 50.0) / 10.0 * sd;
        let hi = mean + (self.hensa_hi - 50.0) / 10.0 * sd;
        debug!(mean, sd, lo, hi, "stddev cuts");
        Ok((lo, hi))
    }
}
