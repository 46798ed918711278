//! CLI command implementations

pub mod check;
pub mod default_pipeline;
pub mod params;
pub mod render;
pub mod stages;

use anyhow::{Context, Result};
use sky_pipeline::PipelineDoc;
use std::path::Path;

/// Load a pipeline document
pub fn load_doc(path: &Path) -> Result<PipelineDoc> {
    PipelineDoc::load_file(path).with_context(|| format!("Failed to load: {}", path.display()))
}
