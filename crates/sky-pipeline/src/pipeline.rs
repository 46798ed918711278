//! The pipeline engine.
//!
//! A [`Pipeline`] owns an ordered list of [`Stage`]s. Stage `i` consumes
//! the result of stage `i - 1`; stage 0 consumes the input slot. After a
//! parameter change only the changed stage and everything after it is
//! re-run:
//!
//! ```text
//! input -> [0 input] -> [1 cuts] -> [2 rgbmap] -> [3 iccprof] -> output
//!                          ^ edit(1, ..) re-runs 1, 2, 3; stage 0 keeps its result
//! ```
//!
//! # Example
//!
//! ```rust
//! use sky_core::PixelBuffer;
//! use sky_pipeline::{CutsParams, Pipeline, StageParams};
//!
//! let mut pipe = Pipeline::default_viewer();
//! pipe.set_input(PixelBuffer::mono(4, 4, (0..16).map(|v| v as f32 * 100.0).collect()).unwrap());
//! let report = pipe.run_all().unwrap();
//! assert!(report.is_ok());
//! assert_eq!(pipe.output().unwrap().order.as_str(), "RGB");
//!
//! // manual levels: only the cuts stage and its successors run again
//! let cuts = pipe.stages().iter().position(|s| s.kind() == "cuts").unwrap();
//! let report = pipe.edit(cuts, StageParams::Cuts(CutsParams::manual(0.0, 800.0))).unwrap();
//! assert_eq!(report.ran[0], cuts);
//! assert!(pipe.undo().unwrap().is_some());
//! ```

use crate::stages::{StageCache, StageContext};
use crate::{
    Action, ActionStack, Blackboard, PipelineDoc, PipelineError, PipelineResult, Stage,
    StageError, StageParams, StageStatus,
};
use sky_core::{ChannelOrder, PixelBuffer, RenderTarget};
use sky_icc::ProfileRegistry;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

/// Progress notification sent to the pipeline observer.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A run is starting at `from`.
    PipelineStart {
        /// First stage of the run.
        from: usize,
    },
    /// A stage is about to run.
    StageExecuting {
        /// Stage index.
        index: usize,
        /// Stage type name.
        kind: &'static str,
    },
    /// A stage finished.
    StageDone {
        /// Stage index.
        index: usize,
        /// Stage type name.
        kind: &'static str,
        /// Time spent in the stage.
        elapsed: Duration,
    },
    /// A stage failed; the run stops here.
    StageErrored {
        /// Stage index.
        index: usize,
        /// Stage type name.
        kind: &'static str,
        /// Error text.
        message: String,
    },
    /// A run ended.
    PipelineDone {
        /// Every stage of the run succeeded.
        completed: bool,
        /// Total run time.
        elapsed: Duration,
    },
}

/// Callback receiving [`PipelineEvent`]s.
pub type Observer = Box<dyn FnMut(&PipelineEvent) + Send>;

/// The stage that stopped a run.
#[derive(Debug)]
pub struct StageFailure {
    /// Stage index.
    pub index: usize,
    /// Stage type name.
    pub kind: &'static str,
    /// What went wrong.
    pub error: StageError,
}

/// Outcome of [`Pipeline::run_from`].
#[derive(Debug)]
pub struct RunReport {
    /// First stage of the run.
    pub from: usize,
    /// Stages that ran successfully, in order.
    pub ran: Vec<usize>,
    /// The failing stage, if any.
    pub failed: Option<StageFailure>,
    /// Total run time.
    pub elapsed: Duration,
}

impl RunReport {
    fn empty(from: usize) -> Self {
        Self { from, ran: Vec::new(), failed: None, elapsed: Duration::ZERO }
    }

    /// Returns true if no stage failed.
    pub fn is_ok(&self) -> bool {
        self.failed.is_none()
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Ordered stages with incremental re-execution, undo/redo and a shared
/// blackboard.
pub struct Pipeline {
    name: String,
    stages: Vec<Stage>,
    input: Option<PixelBuffer>,
    blackboard: Blackboard,
    actions: ActionStack,
    profiles: ProfileRegistry,
    observer: Option<Observer>,
    cursor: usize,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .field("has_input", &self.input.is_some())
            .field("blackboard", &self.blackboard)
            .field("actions", &self.actions)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new("pipeline")
    }
}

impl Pipeline {
    /// Empty pipeline.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            input: None,
            blackboard: Blackboard::default(),
            actions: ActionStack::default(),
            profiles: ProfileRegistry::new(),
            observer: None,
            cursor: 0,
        }
    }

    /// Pipeline with the given stages, all idle.
    pub fn with_stages(name: impl Into<String>, stages: Vec<StageParams>) -> Self {
        let mut pipe = Self::new(name);
        pipe.stages = stages.into_iter().map(Stage::new).collect();
        pipe
    }

    /// The standard display chain: input, cuts, color map, flip/swap,
    /// rotate, ICC, composite.
    pub fn default_viewer() -> Self {
        let mut pipe = Self::new("viewer");
        // a document built in code is always valid
        pipe.stages = PipelineDoc::default_viewer()
            .stages
            .into_iter()
            .map(|s| {
                let mut stage = Stage::new(s.params);
                stage.bypass = s.bypass;
                stage
            })
            .collect();
        pipe
    }

    // === accessors ===

    /// Pipeline name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the pipeline.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if there are no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// All stages.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Stage at `index`.
    pub fn stage(&self, index: usize) -> PipelineResult<&Stage> {
        self.check_index(index)?;
        Ok(&self.stages[index])
    }

    /// Index of the stage most recently run.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Shared stage state.
    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    /// Shared stage state, for the host to fill in overlays and the like.
    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    /// Profiles available to the ICC stage.
    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    /// Profiles available to the ICC stage, for registering new ones.
    pub fn profiles_mut(&mut self) -> &mut ProfileRegistry {
        &mut self.profiles
    }

    /// Undo/redo history.
    pub fn actions(&self) -> &ActionStack {
        &self.actions
    }

    /// Installs the progress observer.
    pub fn set_observer(&mut self, observer: Observer) {
        self.observer = Some(observer);
    }

    /// Removes the progress observer.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Replaces the input data. Every existing result becomes stale; call
    /// [`Self::run_all`] to render it.
    pub fn set_input(&mut self, data: PixelBuffer) {
        debug!(width = data.width, height = data.height, order = %data.order, "pipeline input");
        self.input = Some(data);
        self.mark_stale_from(0);
    }

    /// Current input data.
    pub fn input(&self) -> Option<&PixelBuffer> {
        self.input.as_ref()
    }

    /// Data stage `index` consumes: the input slot for stage 0, otherwise
    /// the previous stage's result.
    pub fn get_data(&self, index: usize) -> PipelineResult<Option<&PixelBuffer>> {
        self.check_index(index)?;
        Ok(self.prev_data(index))
    }

    fn prev_data(&self, index: usize) -> Option<&PixelBuffer> {
        match index {
            0 => self.input.as_ref(),
            i => self.stages[i - 1].result.as_ref(),
        }
    }

    /// Final result, if the last stage holds the product of a complete
    /// successful run.
    pub fn output(&self) -> Option<&PixelBuffer> {
        if self.stages.iter().all(|s| s.status == StageStatus::Done) {
            self.stages.last().and_then(|s| s.result.as_ref())
        } else {
            None
        }
    }

    /// The latest displayable frame: the final result, or the newest
    /// stale-but-valid result after a failed run.
    pub fn last_valid_output(&self) -> Option<&PixelBuffer> {
        self.stages
            .iter()
            .rev()
            .filter(|s| matches!(s.status, StageStatus::Done | StageStatus::Stale))
            .find_map(|s| s.result.as_ref())
    }

    // === render target ===

    /// Copies the target's view geometry and channel order to the
    /// blackboard.
    pub fn sync_viewer(&mut self, target: &dyn RenderTarget) -> PipelineResult<()> {
        self.blackboard.viewer = target.viewer_geometry();
        self.blackboard.order = ChannelOrder::new(target.rgb_order())?;
        Ok(())
    }

    /// Hands [`Self::last_valid_output`] to `target`. Returns false if
    /// there is nothing to show.
    pub fn deliver(&self, target: &mut dyn RenderTarget) -> PipelineResult<bool> {
        let Some(frame) = self.last_valid_output() else {
            return Ok(false);
        };
        target.accept(frame)?;
        Ok(true)
    }

    // === execution ===

    /// Runs every stage.
    pub fn run_all(&mut self) -> PipelineResult<RunReport> {
        if self.stages.is_empty() {
            return Ok(RunReport::empty(0));
        }
        self.run_from(0)
    }

    /// Runs stages `index..len`. Earlier stages are not touched.
    ///
    /// A failing stage stops the run and is reported in the returned
    /// [`RunReport`]; the stages after it keep their previous results and
    /// are marked [`StageStatus::Stale`].
    pub fn run_from(&mut self, index: usize) -> PipelineResult<RunReport> {
        self.check_index(index)?;
        let start = Instant::now();
        self.notify(PipelineEvent::PipelineStart { from: index });
        debug!(pipeline = %self.name, from = index, stages = self.stages.len(), "run");

        let mut report = RunReport::empty(index);
        for i in index..self.stages.len() {
            self.cursor = i;
            let kind = self.stages[i].kind();
            match self.execute(i) {
                Ok(elapsed) => {
                    report.ran.push(i);
                    self.notify(PipelineEvent::StageDone { index: i, kind, elapsed });
                }
                Err(err) => {
                    let elapsed = self.stages[i].elapsed.unwrap_or_default();
                    error!(index = i, kind, elapsed_ms = millis(elapsed), error = %err, "stage failed");
                    self.notify(PipelineEvent::StageErrored {
                        index: i,
                        kind,
                        message: err.to_string(),
                    });
                    for stage in &mut self.stages[i + 1..] {
                        stage.status = StageStatus::Stale;
                    }
                    report.failed = Some(StageFailure { index: i, kind, error: err });
                    break;
                }
            }
        }

        report.elapsed = start.elapsed();
        self.blackboard.last_run_ms = millis(report.elapsed);
        debug!(
            ran = report.ran.len(),
            failed = report.failed.as_ref().map(|f| f.index),
            elapsed_ms = self.blackboard.last_run_ms,
            "run finished"
        );
        self.notify(PipelineEvent::PipelineDone {
            completed: report.is_ok(),
            elapsed: report.elapsed,
        });
        Ok(report)
    }

    /// Runs a single stage. Later stages become stale.
    pub fn run_stage_idx(&mut self, index: usize) -> PipelineResult<()> {
        self.check_index(index)?;
        self.cursor = index;
        let kind = self.stages[index].kind();
        let outcome = self.execute(index);
        self.mark_stale_from(index + 1);
        match outcome {
            Ok(elapsed) => {
                self.notify(PipelineEvent::StageDone { index, kind, elapsed });
                Ok(())
            }
            Err(source) => {
                self.notify(PipelineEvent::StageErrored { index, kind, message: source.to_string() });
                Err(PipelineError::Stage { index, kind, source })
            }
        }
    }

    fn execute(&mut self, index: usize) -> Result<Duration, StageError> {
        let kind = self.stages[index].kind();
        self.notify(PipelineEvent::StageExecuting { index, kind });
        let start = Instant::now();

        let (before, rest) = self.stages.split_at_mut(index);
        let prev = match before.last() {
            None => self.input.as_ref(),
            Some(s) => s.result.as_ref(),
        };
        let stage = &mut rest[0];
        stage.status = StageStatus::Executing;

        let outcome = if stage.bypass {
            trace!(index, kind, "bypassed");
            Ok(prev.cloned())
        } else {
            let mut ctx = StageContext {
                index,
                input: self.input.as_ref(),
                blackboard: &mut self.blackboard,
                profiles: &self.profiles,
            };
            stage.params.run(prev, &mut ctx, &mut stage.cache).map(Some)
        };

        let elapsed = start.elapsed();
        stage.elapsed = Some(elapsed);
        match outcome {
            Ok(result) => {
                trace!(index, kind, elapsed_ms = millis(elapsed), "stage done");
                stage.result = result;
                stage.status = StageStatus::Done;
                Ok(elapsed)
            }
            Err(err) => {
                stage.status = StageStatus::Errored;
                Err(err)
            }
        }
    }

    // === structure ===

    /// Inserts a stage at `index` (`index == len` appends). Clears the
    /// undo history.
    pub fn insert(&mut self, index: usize, params: StageParams) -> PipelineResult<()> {
        if index > self.stages.len() {
            return Err(PipelineError::IndexOutOfRange { index, len: self.stages.len() });
        }
        debug!(index, kind = params.kind(), "insert stage");
        self.stages.insert(index, Stage::new(params));
        self.mark_stale_from(index + 1);
        self.actions.clear();
        Ok(())
    }

    /// Appends a stage. Clears the undo history.
    pub fn append(&mut self, params: StageParams) {
        debug!(kind = params.kind(), "append stage");
        self.stages.push(Stage::new(params));
        self.actions.clear();
    }

    /// Removes and returns the parameters of the stage at `index`. Clears
    /// the undo history.
    pub fn remove(&mut self, index: usize) -> PipelineResult<StageParams> {
        self.check_index(index)?;
        let stage = self.stages.remove(index);
        debug!(index, kind = stage.kind(), "remove stage");
        self.mark_stale_from(index);
        self.actions.clear();
        Ok(stage.params)
    }

    /// Moves the stage at `from` to position `to`. Clears the undo
    /// history.
    pub fn move_stage(&mut self, from: usize, to: usize) -> PipelineResult<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }
        let stage = self.stages.remove(from);
        debug!(from, to, kind = stage.kind(), "move stage");
        self.stages.insert(to, stage);
        self.mark_stale_from(from.min(to));
        self.actions.clear();
        Ok(())
    }

    fn mark_stale_from(&mut self, index: usize) {
        for stage in self.stages.iter_mut().skip(index) {
            if stage.status == StageStatus::Done {
                stage.status = StageStatus::Stale;
            }
        }
    }

    // === undoable edits ===

    /// Replaces the parameters of stage `index`, records the change for
    /// undo and re-runs from `index`.
    ///
    /// Invalid parameters are rejected before anything changes.
    pub fn edit(&mut self, index: usize, params: StageParams) -> PipelineResult<RunReport> {
        self.check_index(index)?;
        params
            .validate()
            .map_err(|source| PipelineError::InvalidParams { index, kind: params.kind(), source })?;
        let old = self.set_params(index, params.clone());
        if old != params {
            self.actions.push(Action::SetParams {
                index,
                old: Box::new(old),
                new: Box::new(params),
            });
        }
        self.run_from(index)
    }

    /// Sets the bypass flag of stage `index`, records the change for undo
    /// and re-runs from `index`.
    pub fn set_bypass(&mut self, index: usize, bypass: bool) -> PipelineResult<RunReport> {
        self.check_index(index)?;
        let old = std::mem::replace(&mut self.stages[index].bypass, bypass);
        if old != bypass {
            self.actions.push(Action::SetBypass { index, old, new: bypass });
        }
        self.run_from(index)
    }

    /// Reverts the most recent edit and re-runs from its stage. Returns
    /// `None` if there is nothing to undo.
    pub fn undo(&mut self) -> PipelineResult<Option<RunReport>> {
        let Some(action) = self.actions.pop_undo() else {
            return Ok(None);
        };
        let index = action.index();
        if let Err(e) = self.check_index(index) {
            warn!(index, "undo target no longer exists");
            return Err(e);
        }
        debug!(index, "undo");
        self.apply(&action, false);
        self.actions.push_redo(action);
        self.run_from(index).map(Some)
    }

    /// Re-applies the most recently undone edit and re-runs from its
    /// stage. Returns `None` if there is nothing to redo.
    pub fn redo(&mut self) -> PipelineResult<Option<RunReport>> {
        let Some(action) = self.actions.pop_redo() else {
            return Ok(None);
        };
        let index = action.index();
        if let Err(e) = self.check_index(index) {
            warn!(index, "redo target no longer exists");
            return Err(e);
        }
        debug!(index, "redo");
        self.apply(&action, true);
        self.actions.push_undone(action);
        self.run_from(index).map(Some)
    }

    /// Returns true if there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.actions.can_undo()
    }

    /// Returns true if there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.actions.can_redo()
    }

    fn apply(&mut self, action: &Action, forward: bool) {
        match action {
            Action::SetParams { index, old, new } => {
                let params = if forward { new } else { old };
                self.set_params(*index, params.as_ref().clone());
            }
            Action::SetBypass { index, old, new } => {
                self.stages[*index].bypass = if forward { *new } else { *old };
            }
        }
    }

    /// Swaps in new parameters; a change of stage type drops the runtime
    /// cache.
    fn set_params(&mut self, index: usize, params: StageParams) -> StageParams {
        let stage = &mut self.stages[index];
        if stage.params.kind() != params.kind() {
            stage.cache = StageCache::default();
        }
        std::mem::replace(&mut stage.params, params)
    }

    // === persistence ===

    /// Serializable description of the stages.
    pub fn save(&self) -> PipelineDoc {
        PipelineDoc::from_stages(&self.name, &self.stages)
    }

    /// Replaces all stages with those in `doc`. Undo history and the
    /// blackboard are reset; the input slot, observer and profiles are
    /// kept.
    pub fn load(&mut self, doc: PipelineDoc) {
        debug!(name = %doc.name, stages = doc.stages.len(), "load pipeline");
        self.name = doc.name;
        self.stages = doc
            .stages
            .into_iter()
            .map(|s| {
                let mut stage = Stage::new(s.params);
                stage.bypass = s.bypass;
                stage
            })
            .collect();
        self.actions.clear();
        self.blackboard = Blackboard::default();
        self.cursor = 0;
    }

    /// Builds a pipeline from a document.
    pub fn from_doc(doc: PipelineDoc) -> Self {
        let mut pipe = Self::new(doc.name.clone());
        pipe.load(doc);
        pipe
    }

    /// YAML text of [`Self::save`].
    pub fn to_yaml(&self) -> PipelineResult<String> {
        self.save().to_yaml()
    }

    /// Parses YAML and [`Self::load`]s it.
    pub fn load_yaml(&mut self, text: &str) -> PipelineResult<()> {
        self.load(PipelineDoc::from_yaml(text)?);
        Ok(())
    }

    /// Writes the pipeline document to `path`.
    pub fn save_file(&self, path: &Path) -> PipelineResult<()> {
        self.save().save_file(path)
    }

    /// Reads a pipeline document from `path` and [`Self::load`]s it.
    pub fn load_file(&mut self, path: &Path) -> PipelineResult<()> {
        self.load(PipelineDoc::load_file(path)?);
        Ok(())
    }

    fn check_index(&self, index: usize) -> PipelineResult<()> {
        if index >= self.stages.len() {
            return Err(PipelineError::IndexOutOfRange { index, len: self.stages.len() });
        }
        Ok(())
    }

    fn notify(&mut self, event: PipelineEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CutsParams, FlipSwapParams, RotateParams};
    use sky_cmap::MapperSettings;
    use sky_core::{BitDepth, ViewerGeometry};
    use sky_cuts::AutoCuts;
    use std::sync::{Arc, Mutex};

    fn ramp(w: usize, h: usize) -> PixelBuffer {
        PixelBuffer::mono(w, h, (0..w * h).map(|v| v as f32 * 10.0).collect()).unwrap()
    }

    fn record(pipe: &mut Pipeline) -> Arc<Mutex<Vec<PipelineEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        pipe.set_observer(Box::new(move |e| sink.lock().unwrap().push(e.clone())));
        events
    }

    fn executed(events: &Mutex<Vec<PipelineEvent>>) -> Vec<usize> {
        events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::StageExecuting { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }

    fn starts(events: &Mutex<Vec<PipelineEvent>>) -> usize {
        events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, PipelineEvent::PipelineStart { .. }))
            .count()
    }

    fn mono_chain() -> Pipeline {
        let cuts = CutsParams { algorithm: AutoCuts::Minmax, ..Default::default() };
        Pipeline::with_stages(
            "test",
            vec![
                StageParams::Input,
                StageParams::Cuts(cuts),
                StageParams::RgbMap(MapperSettings::default()),
                StageParams::FlipSwap(FlipSwapParams::default()),
            ],
        )
    }

    #[test]
    fn test_run_all_renders_rgb() {
        let mut pipe = mono_chain();
        pipe.set_input(ramp(8, 4));
        let report = pipe.run_all().unwrap();
        assert!(report.is_ok());
        assert_eq!(report.ran, vec![0, 1, 2, 3]);
        let out = pipe.output().unwrap();
        assert_eq!((out.size(), out.order.as_str()), ((8, 4), "RGB"));
        assert_eq!(out.depth, BitDepth::U8);
        assert_eq!(out.pixel(0, 0).unwrap(), &[0.0, 0.0, 0.0]);
        assert!(pipe.stages().iter().all(|s| s.status() == StageStatus::Done));
        assert!(pipe.blackboard().last_run_ms >= 0.0);
    }

    #[test]
    fn test_run_from_leaves_earlier_stages() {
        let mut pipe = mono_chain();
        pipe.set_input(ramp(8, 4));
        pipe.run_all().unwrap();
        let first = pipe.stage(0).unwrap().result().cloned();

        let events = record(&mut pipe);
        let report = pipe.run_from(2).unwrap();
        assert_eq!(report.ran, vec![2, 3]);
        assert_eq!(executed(&events), vec![2, 3]);
        assert_eq!(pipe.stage(0).unwrap().result().cloned(), first);
        assert_eq!(pipe.cursor(), 3);
    }

    #[test]
    fn test_failure_halts_and_marks_stale() {
        let mut pipe = mono_chain();
        pipe.set_input(ramp(4, 4));
        pipe.run_all().unwrap();
        let good = pipe.output().cloned().unwrap();

        // color input: the color map stage rejects it
        pipe.set_input(PixelBuffer::new(4, 4, 3, BitDepth::U8, vec![9.0; 48]).unwrap());
        let events = record(&mut pipe);
        let report = pipe.run_all().unwrap();
        let failed = report.failed.as_ref().unwrap();
        assert_eq!((failed.index, failed.kind), (2, "rgbmap"));
        assert!(matches!(failed.error, StageError::Unsupported(_)));
        assert_eq!(report.ran, vec![0, 1]);
        assert_eq!(pipe.stage(2).unwrap().status(), StageStatus::Errored);
        assert_eq!(pipe.stage(3).unwrap().status(), StageStatus::Stale);
        assert!(pipe.output().is_none());
        assert_eq!(pipe.last_valid_output(), Some(&good));
        assert!(events.lock().unwrap().iter().any(|e| matches!(
            e,
            PipelineEvent::StageErrored { index: 2, .. }
        )));

        // recovers once the input is usable again
        pipe.set_input(ramp(4, 4));
        assert!(pipe.run_all().unwrap().is_ok());
        assert!(pipe.output().is_some());
    }

    #[test]
    fn test_missing_input() {
        let mut pipe = mono_chain();
        let report = pipe.run_all().unwrap();
        let failed = report.failed.unwrap();
        assert_eq!(failed.index, 0);
        assert!(matches!(failed.error, StageError::NoInput));
        assert!(pipe.last_valid_output().is_none());
    }

    #[test]
    fn test_misplaced_input_stage() {
        let mut pipe = Pipeline::with_stages(
            "bad",
            vec![StageParams::FlipSwap(FlipSwapParams::default()), StageParams::Input],
        );
        pipe.set_input(ramp(2, 2));
        let report = pipe.run_all().unwrap();
        // stage 0 reads the input slot directly
        assert_eq!(report.ran, vec![0]);
        let failed = report.failed.unwrap();
        assert!(matches!(failed.error, StageError::MisplacedInput(1)));
    }

    #[test]
    fn test_bypass_passes_through() {
        let flip = FlipSwapParams { flip_x: true, ..Default::default() };
        let mut pipe = Pipeline::with_stages(
            "bypass",
            vec![StageParams::Input, StageParams::FlipSwap(flip)],
        );
        pipe.set_input(ramp(3, 1));
        pipe.run_all().unwrap();
        assert_ne!(pipe.output(), Some(&ramp(3, 1)));

        let report = pipe.set_bypass(1, true).unwrap();
        assert_eq!(report.ran, vec![1]);
        assert_eq!(pipe.output(), Some(&ramp(3, 1)));
        assert!(pipe.can_undo());
    }

    #[test]
    fn test_bypass_without_input() {
        let mut pipe = Pipeline::with_stages(
            "empty",
            vec![StageParams::FlipSwap(FlipSwapParams::default())],
        );
        pipe.set_bypass(0, true).unwrap();
        assert_eq!(pipe.stage(0).unwrap().status(), StageStatus::Done);
        assert!(pipe.stage(0).unwrap().result().is_none());
    }

    #[test]
    fn test_edit_undo_redo() {
        let mut pipe = mono_chain();
        pipe.set_input(ramp(4, 4));
        pipe.run_all().unwrap();
        let before = pipe.output().cloned();
        let old = pipe.stage(3).unwrap().params().clone();
        let events = record(&mut pipe);

        let flipped = StageParams::FlipSwap(FlipSwapParams { flip_y: true, ..Default::default() });
        pipe.edit(3, flipped.clone()).unwrap();
        assert_eq!(pipe.stage(3).unwrap().params(), &flipped);
        assert_eq!(starts(&events), 1);
        let after = pipe.output().cloned();
        assert_ne!(after, before);

        let report = pipe.undo().unwrap().unwrap();
        assert_eq!(report.ran, vec![3]);
        assert_eq!(starts(&events), 2);
        assert_eq!(pipe.stage(3).unwrap().params(), &old);
        assert_eq!(pipe.output().cloned(), before);
        assert!(pipe.can_redo());

        pipe.redo().unwrap().unwrap();
        assert_eq!(starts(&events), 3);
        assert_eq!(pipe.stage(3).unwrap().params(), &flipped);
        assert_eq!(pipe.output().cloned(), after);
        assert!(!pipe.can_redo());
        assert!(pipe.redo().unwrap().is_none());
        assert_eq!(starts(&events), 3);
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut pipe = mono_chain();
        pipe.set_input(ramp(4, 4));
        pipe.set_bypass(3, true).unwrap();
        pipe.undo().unwrap();
        assert!(pipe.can_redo());
        pipe.set_bypass(2, true).unwrap();
        assert!(!pipe.can_redo());
    }

    #[test]
    fn test_invalid_edit_rejected() {
        let mut pipe = Pipeline::with_stages("crop", vec![StageParams::Input]);
        pipe.append(StageParams::default_for("crop").unwrap());
        let bad = StageParams::Crop(crate::CropParams { x1: 0.9, x2: 0.1, ..Default::default() });
        let err = pipe.edit(1, bad).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParams { index: 1, kind: "crop", .. }));
        assert_eq!(pipe.stage(1).unwrap().params(), &StageParams::default_for("crop").unwrap());
        assert!(!pipe.can_undo());
    }

    #[test]
    fn test_index_out_of_range() {
        let mut pipe = mono_chain();
        assert!(matches!(
            pipe.run_from(4),
            Err(PipelineError::IndexOutOfRange { index: 4, len: 4 })
        ));
        assert!(pipe.edit(9, StageParams::Input).is_err());
        assert!(pipe.set_bypass(4, true).is_err());
        assert!(pipe.run_stage_idx(4).is_err());
        assert!(pipe.get_data(4).is_err());
        assert!(pipe.insert(6, StageParams::Input).is_err());
        assert!(pipe.move_stage(0, 4).is_err());
    }

    #[test]
    fn test_structural_edits() {
        let mut pipe = mono_chain();
        pipe.set_input(ramp(4, 4));
        pipe.run_all().unwrap();
        pipe.set_bypass(3, true).unwrap();
        assert!(pipe.can_undo());

        pipe.insert(3, StageParams::Rotate(RotateParams { angle: 90.0, ..Default::default() }))
            .unwrap();
        assert!(!pipe.can_undo());
        assert_eq!(pipe.stage(3).unwrap().status(), StageStatus::Idle);
        assert_eq!(pipe.stage(4).unwrap().status(), StageStatus::Stale);
        assert!(pipe.output().is_none());

        pipe.move_stage(3, 4).unwrap();
        assert_eq!(pipe.stage(4).unwrap().kind(), "rotate");
        let removed = pipe.remove(4).unwrap();
        assert_eq!(removed.kind(), "rotate");
        assert_eq!(pipe.len(), 4);
        assert!(pipe.run_all().unwrap().is_ok());
    }

    #[test]
    fn test_run_stage_idx_marks_later_stale() {
        let mut pipe = mono_chain();
        pipe.set_input(ramp(4, 4));
        pipe.run_all().unwrap();
        pipe.run_stage_idx(1).unwrap();
        assert_eq!(pipe.stage(1).unwrap().status(), StageStatus::Done);
        assert_eq!(pipe.stage(2).unwrap().status(), StageStatus::Stale);
        assert!(pipe.output().is_none());
        assert!(pipe.last_valid_output().is_some());
    }

    #[test]
    fn test_auto_cuts_recorded() {
        let mut pipe = mono_chain();
        pipe.set_input(ramp(4, 4));
        pipe.run_all().unwrap();
        assert_eq!(pipe.blackboard().cut_levels, Some((0.0, 150.0)));
        match pipe.stage(1).unwrap().params() {
            StageParams::Cuts(c) => assert_eq!((c.lo, c.hi), (0.0, 150.0)),
            other => panic!("unexpected {other:?}"),
        }
        // levels written back by a run are not an undoable edit
        assert!(!pipe.can_undo());
    }

    #[test]
    fn test_get_data() {
        let mut pipe = mono_chain();
        pipe.set_input(ramp(2, 2));
        assert_eq!(pipe.get_data(0).unwrap(), Some(&ramp(2, 2)));
        assert_eq!(pipe.get_data(1).unwrap(), None);
        pipe.run_all().unwrap();
        assert_eq!(pipe.get_data(1).unwrap(), Some(&ramp(2, 2)));
    }

    struct Screen {
        frames: Vec<PixelBuffer>,
    }

    impl RenderTarget for Screen {
        fn viewer_geometry(&self) -> ViewerGeometry {
            ViewerGeometry { window_size: (640, 480), ..Default::default() }
        }

        fn rgb_order(&self) -> &str {
            "BGRA"
        }

        fn accept(&mut self, frame: &PixelBuffer) -> sky_core::Result<()> {
            self.frames.push(frame.clone());
            Ok(())
        }
    }

    #[test]
    fn test_deliver_to_target() {
        let mut screen = Screen { frames: Vec::new() };
        let mut pipe = mono_chain();
        assert!(!pipe.deliver(&mut screen).unwrap());

        pipe.sync_viewer(&screen).unwrap();
        assert_eq!(pipe.blackboard().viewer.window_size, (640, 480));
        pipe.set_input(ramp(4, 4));
        pipe.run_all().unwrap();
        assert!(pipe.deliver(&mut screen).unwrap());
        assert_eq!(screen.frames.len(), 1);
        assert_eq!(screen.frames[0].order.as_str(), "BGRA");
    }

    #[test]
    fn test_load_resets_history_and_blackboard() {
        let mut pipe = mono_chain();
        pipe.set_input(ramp(4, 4));
        pipe.set_bypass(3, true).unwrap();
        let doc = pipe.save();
        assert!(doc.stages[3].bypass);

        pipe.load(doc.clone());
        assert!(!pipe.can_undo());
        assert_eq!(pipe.blackboard().cut_levels, None);
        assert!(pipe.stage(3).unwrap().bypass());
        assert_eq!(pipe.stage(0).unwrap().status(), StageStatus::Idle);
        assert!(pipe.input().is_some());
        assert_eq!(pipe.save(), doc);
    }
}
