//! Error types for stage execution and pipeline management.
//!
//! Two layers:
//!
//! - [`StageError`] - raised by a single stage while it runs. The engine
//!   catches it, marks the stage `Errored` and stops the run; it reaches
//!   callers inside a [`RunReport`](crate::RunReport).
//! - [`PipelineError`] - structural problems returned immediately: bad
//!   indices, unknown stage types, malformed documents, I/O.

use sky_cmap::CmapError;
use sky_cuts::AutoCutsError;
use sky_icc::IccError;
use sky_ops::OpsError;
use thiserror::Error;

/// Result of a single stage.
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Result of a pipeline operation.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Failure inside one stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// The stage needs an input buffer and its predecessor produced none.
    #[error("no input data")]
    NoInput,

    /// An `input` stage placed after another stage.
    #[error("input stage must be first, found at index {0}")]
    MisplacedInput(usize),

    /// Parameters failed validation.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// The input buffer has a layout the stage cannot handle.
    #[error("unsupported input: {0}")]
    Unsupported(String),

    /// Pixel operation failed.
    #[error(transparent)]
    Ops(#[from] OpsError),

    /// Cut-level computation failed.
    #[error(transparent)]
    Cuts(#[from] AutoCutsError),

    /// Color mapping failed.
    #[error(transparent)]
    Cmap(#[from] CmapError),

    /// Color management failed.
    #[error(transparent)]
    Icc(#[from] IccError),

    /// Buffer construction failed.
    #[error(transparent)]
    Core(#[from] sky_core::Error),
}

/// Structural pipeline error.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Stage index outside the pipeline.
    #[error("stage index {index} out of range (pipeline has {len} stages)")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of stages.
        len: usize,
    },

    /// A document names a stage type that does not exist.
    #[error("unknown stage type '{0}'")]
    UnknownStage(String),

    /// A document is well-formed YAML but not a pipeline.
    #[error("invalid pipeline document: {0}")]
    Document(String),

    /// New parameters for a stage were rejected before being applied.
    #[error("stage {index} ({kind}): {source}")]
    InvalidParams {
        /// Stage index.
        index: usize,
        /// Stage type name.
        kind: &'static str,
        /// Validation failure.
        #[source]
        source: StageError,
    },

    /// A single stage run through [`Pipeline::run_stage_idx`](crate::Pipeline::run_stage_idx) failed.
    #[error("stage {index} ({kind}) failed: {source}")]
    Stage {
        /// Stage index.
        index: usize,
        /// Stage type name.
        kind: &'static str,
        /// What went wrong.
        #[source]
        source: StageError,
    },

    /// Render target interaction failed (bad channel order, rejected frame).
    #[error(transparent)]
    Core(#[from] sky_core::Error),

    /// YAML (de)serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Reading or writing a document failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
