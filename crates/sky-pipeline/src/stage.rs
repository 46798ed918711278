//! A stage slot in a pipeline.

use crate::StageParams;
use crate::stages::StageCache;
use sky_core::PixelBuffer;
use std::time::Duration;

/// Execution state of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageStatus {
    /// Never run since it was created or loaded.
    #[default]
    Idle,
    /// Currently running.
    Executing,
    /// Last run succeeded.
    Done,
    /// Last run failed.
    Errored,
    /// An earlier stage failed; the result is from an older run.
    Stale,
}

/// Parameters, bypass flag, last result and runtime cache of one stage.
#[derive(Debug)]
pub struct Stage {
    pub(crate) params: StageParams,
    pub(crate) bypass: bool,
    pub(crate) status: StageStatus,
    pub(crate) result: Option<PixelBuffer>,
    pub(crate) elapsed: Option<Duration>,
    pub(crate) cache: StageCache,
}

impl Stage {
    /// New idle stage.
    pub fn new(params: StageParams) -> Self {
        Self {
            params,
            bypass: false,
            status: StageStatus::Idle,
            result: None,
            elapsed: None,
            cache: StageCache::default(),
        }
    }

    /// Stage type name.
    pub fn kind(&self) -> &'static str {
        self.params.kind()
    }

    /// Current parameters.
    pub fn params(&self) -> &StageParams {
        &self.params
    }

    /// Returns true if the stage passes its input through.
    pub fn bypass(&self) -> bool {
        self.bypass
    }

    /// Execution state.
    pub fn status(&self) -> StageStatus {
        self.status
    }

    /// Output of the last successful run.
    pub fn result(&self) -> Option<&PixelBuffer> {
        self.result.as_ref()
    }

    /// Duration of the last run.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }
}

impl From<StageParams> for Stage {
    fn from(params: StageParams) -> Self {
        Stage::new(params)
    }
}
