//! Min/max cut levels, with and without rescaling.

use crate::{AutoCutsResult, CutLevels, check_input, levels, stats};
use serde::{Deserialize, Serialize};
use sky_core::PixelBuffer;
use tracing::warn;

/// Cut levels at the finite data minimum and maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Minmax;

/// Like [`Minmax`], but [`CutLevels::cut_levels`] only clamps the data to
/// the output range instead of rescaling it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Clip;

fn minmax(data: &PixelBuffer) -> AutoCutsResult<(f64, f64)> {
    check_input(data)?;
    match stats::finite_minmax(&data.data) {
        Some((lo, hi)) => Ok((lo as f64, hi as f64)),
        None => {
            warn!("minmax: no finite samples, using flat levels");
            Ok((0.0, 0.0))
        }
    }
}

impl CutLevels for Minmax {
    fn calc_cuts_from_data(&self, data: &PixelBuffer) -> AutoCutsResult<(f64, f64)> {
        minmax(data)
    }
}

impl CutLevels for Clip {
    fn calc_cuts_from_data(&self, data: &PixelBuffer) -> AutoCutsResult<(f64, f64)> {
        minmax(data)
    }

    fn cut_levels(&self, data: &[f32], _lo: f64, _hi: f64, vmin: f64, vmax: f64) -> Vec<f32> {
        levels::clip_levels(data, vmin, vmax)
    }
}
