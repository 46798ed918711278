//! # sky-pipeline
//!
//! Incremental rendering pipeline for astronomical image display.
//!
//! Raw pixels go into the pipeline's input slot and come out as an RGB(A)
//! frame ready for a viewer. Each [`Stage`] consumes the previous stage's
//! result; after a parameter change only the changed stage and its
//! successors run again.
//!
//! - [`Pipeline`] - stage list, execution, undo/redo, persistence
//! - [`StageParams`] - every stage type with its parameters
//! - [`Blackboard`] - typed state shared between stages
//! - [`ActionStack`] - bounded undo/redo history
//! - [`PipelineDoc`] - YAML document form
//!
//! # Example
//!
//! ```rust
//! use sky_core::PixelBuffer;
//! use sky_pipeline::{Pipeline, PipelineDoc};
//!
//! let yaml = "
//! name: quicklook
//! stages:
//!   - type: input
//!   - type: cuts
//!     algorithm: {name: minmax}
//!   - type: rgbmap
//!     color_map: gray
//! ";
//! let mut pipe = Pipeline::from_doc(PipelineDoc::from_yaml(yaml).unwrap());
//! pipe.set_input(PixelBuffer::mono(2, 1, vec![0.0, 1000.0]).unwrap());
//! pipe.run_all().unwrap();
//! let frame = pipe.output().unwrap();
//! assert_eq!(frame.pixel(0, 0).unwrap(), &[0.0, 0.0, 0.0]);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod action;
mod blackboard;
mod doc;
mod error;
mod pipeline;
mod stage;
pub mod stages;

pub use action::{Action, ActionStack, DEFAULT_MAX_STEPS};
pub use blackboard::{Blackboard, Overlay};
pub use doc::{PipelineDoc, StageDoc};
pub use error::{PipelineError, PipelineResult, StageError, StageResult};
pub use pipeline::{Observer, Pipeline, PipelineEvent, RunReport, StageFailure};
pub use stage::{Stage, StageStatus};
pub use stages::{
    ChannelMixerParams, CompositeParams, CropParams, CutsParams, FlipSwapParams, IccParams,
    RotateParams, ScaleParams, ScaleTarget, SharpenParams, StageParams, WhiteBalanceParams,
};
