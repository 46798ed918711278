//! Level stages: cut levels and color mapping.

use super::invalid;
use crate::{Blackboard, StageError, StageResult};
use serde::{Deserialize, Serialize};
use sky_cmap::{MapperSettings, RgbMapper};
use sky_core::{BitDepth, PixelBuffer};
use sky_cuts::AutoCuts;
use tracing::debug;

/// Cut levels and rescale into `[vmin, vmax]`.
///
/// In auto mode the levels are recomputed from the input on every run and
/// written back into [`lo`](Self::lo) / [`hi`](Self::hi) and the
/// blackboard. Otherwise `lo` / `hi` are used as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutsParams {
    /// Algorithm used in auto mode.
    pub algorithm: AutoCuts,
    /// Recompute levels from the data on every run.
    pub auto: bool,
    /// Low cut level.
    pub lo: f64,
    /// High cut level.
    pub hi: f64,
    /// Output value for `lo`.
    pub vmin: f64,
    /// Output value for `hi`.
    pub vmax: f64,
}

impl Default for CutsParams {
    fn default() -> Self {
        Self {
            algorithm: AutoCuts::default(),
            auto: true,
            lo: 0.0,
            hi: 0.0,
            vmin: 0.0,
            vmax: 65535.0,
        }
    }
}

impl CutsParams {
    /// Manual levels.
    pub fn manual(lo: f64, hi: f64) -> Self {
        Self { auto: false, lo, hi, ..Self::default() }
    }

    pub(crate) fn validate(&self) -> StageResult<()> {
        self.algorithm.validate()?;
        if ![self.lo, self.hi, self.vmin, self.vmax].iter().all(|v| v.is_finite()) {
            return Err(invalid("cut levels must be finite"));
        }
        if self.vmin > self.vmax {
            return Err(invalid(format!("vmin {} > vmax {}", self.vmin, self.vmax)));
        }
        Ok(())
    }

    pub(crate) fn run(&mut self, src: &PixelBuffer, bb: &mut Blackboard) -> StageResult<PixelBuffer> {
        self.validate()?;
        if self.auto {
            let (lo, hi) = self.algorithm.calc_cut_levels(src)?;
            debug!(algorithm = self.algorithm.name(), lo, hi, "auto cut levels");
            self.lo = lo;
            self.hi = hi;
        }
        bb.cut_levels = Some((self.lo, self.hi));

        let mut data = self.algorithm.cut_levels(&src.data, self.lo, self.hi, self.vmin, self.vmax);
        if let Some(a) = src.order.index_of('A') {
            let nc = src.channels;
            for (d, s) in data.chunks_exact_mut(nc).zip(src.data.chunks_exact(nc)) {
                d[a] = s[a];
            }
        }
        Ok(PixelBuffer::with_order(
            src.width,
            src.height,
            BitDepth::F32,
            src.order.clone(),
            data,
        )?)
    }
}

/// Runs the color-mapping stage, keeping a live mapper between runs.
///
/// Only settings that changed since the previous run are applied to the
/// cached mapper, so a contrast drag does not rebuild the distribution.
pub(crate) fn run_rgbmap(
    settings: &MapperSettings,
    src: &PixelBuffer,
    bb: &Blackboard,
    cache: &mut Option<RgbMapper>,
) -> StageResult<PixelBuffer> {
    if !src.is_mono() {
        return Err(StageError::Unsupported(format!(
            "color mapping needs single-band input, got {}",
            src.order
        )));
    }
    let mapper = match cache.take() {
        Some(mut mapper) => {
            let changed = mapper.apply_settings(settings)?;
            debug!(changed, "reusing RGB mapper");
            mapper
        }
        None => RgbMapper::from_settings(settings)?,
    };
    let out = mapper.get_rgb_array(src, bb.order.as_str());
    *cache = Some(mapper);
    Ok(out?)
}
