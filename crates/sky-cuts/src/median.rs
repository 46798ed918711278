//! Cut levels from a median-filtered sample.

use crate::params::{ParamKind, ParamSpec, ParamValue, check_range};
use crate::{AutoCutsResult, CutLevels, check_input, stats};
use serde::{Deserialize, Serialize};
use sky_core::{ImageSource, PixelBuffer};
use tracing::{debug, warn};

/// Takes a strided sample of about `num_points` pixels, median-filters it
/// with a `length x length` window and returns the filtered min/max.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedianFilter {
    /// Target sample count.
    pub num_points: usize,
    /// Filter window side.
    pub length: usize,
}

impl Default for MedianFilter {
    fn default() -> Self {
        Self { num_points: 2000, length: 5 }
    }
}

const NUM_POINTS: ParamSpec = ParamSpec {
    name: "num_points",
    kind: ParamKind::Int,
    default: ParamValue::Int(2000),
    range: Some((1.0, 1.0e7)),
    description: "Approximate number of pixels to sample",
};

const LENGTH: ParamSpec = ParamSpec {
    name: "length",
    kind: ParamKind::Int,
    default: ParamValue::Int(5),
    range: Some((1.0, 99.0)),
    description: "Median filter window side in pixels",
};

pub(crate) const PARAMS: &[ParamSpec] = &[NUM_POINTS, LENGTH];

impl CutLevels for MedianFilter {
    fn validate(&self) -> AutoCutsResult<()> {
        check_range(&NUM_POINTS, self.num_points as f64)?;
        check_range(&LENGTH, self.length as f64)
    }

    fn calc_cuts_from_data(&self, data: &PixelBuffer) -> AutoCutsResult<(f64, f64)> {
        self.validate()?;
        check_input(data)?;
        let (w, h) = data.size();
        let xmax = w.saturating_sub(1).max(1) as f64;
        let ymax = h.saturating_sub(1).max(1) as f64;
        let skip = ((xmax * ymax / self.num_points as f64).sqrt() as usize).max(1);
        let sample = data.cutout_data(0, 0, w, h, skip, skip)?;

        let filtered = stats::median_filter(&sample.data, sample.width, sample.height, self.length);
        let Some((lo, hi)) = stats::finite_minmax(&filtered) else {
            warn!("median: no finite samples, using flat levels");
            return Ok((0.0, 0.0));
        };
        debug!(skip, length = self.length, lo, hi, "median cuts");
        Ok((lo as f64, hi as f64))
    }
}
