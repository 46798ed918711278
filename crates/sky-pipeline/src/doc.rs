//! Pipeline documents.
//!
//! A pipeline is stored as YAML:
//!
//! ```yaml
//! name: viewer
//! stages:
//!   - type: input
//!     bypass: false
//!   - type: cuts
//!     algorithm:
//!       name: zscale
//!       contrast: 0.25
//!     auto: true
//!   - type: rgbmap
//!     color_map: gray
//! ```
//!
//! Every stage entry needs a `type`; `bypass` defaults to false and
//! omitted parameters take their defaults. An unknown `type` is an error.

use crate::{PipelineError, PipelineResult, Stage, StageParams};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::debug;

/// One stage entry of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct StageDoc {
    /// Stage type and parameters.
    pub params: StageParams,
    /// Pass input through unchanged.
    pub bypass: bool,
}

impl From<StageParams> for StageDoc {
    fn from(params: StageParams) -> Self {
        Self { params, bypass: false }
    }
}

/// Serializable pipeline description.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineDoc {
    /// Pipeline name.
    pub name: String,
    /// Stages in execution order.
    pub stages: Vec<StageDoc>,
}

#[derive(Serialize, Deserialize)]
struct RawDoc {
    #[serde(default)]
    name: String,
    #[serde(default)]
    stages: Vec<Mapping>,
}

impl PipelineDoc {
    /// The standard display chain.
    pub fn default_viewer() -> Self {
        let stages = ["input", "cuts", "rgbmap", "flipswap", "rotate", "iccprof", "composite"]
            .into_iter()
            .filter_map(StageParams::default_for)
            .map(StageDoc::from)
            .collect();
        Self { name: "viewer".into(), stages }
    }

    pub(crate) fn from_stages(name: &str, stages: &[Stage]) -> Self {
        Self {
            name: name.to_string(),
            stages: stages
                .iter()
                .map(|s| StageDoc { params: s.params.clone(), bypass: s.bypass })
                .collect(),
        }
    }

    /// Stage type names in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.params.kind()).collect()
    }

    /// Serializes to YAML.
    pub fn to_yaml(&self) -> PipelineResult<String> {
        let stages = self
            .stages
            .iter()
            .map(|s| {
                let Value::Mapping(mut map) = serde_yaml::to_value(&s.params)? else {
                    return Err(PipelineError::Document(format!(
                        "{} parameters did not serialize to a mapping",
                        s.params.kind()
                    )));
                };
                map.insert(Value::String("bypass".into()), Value::Bool(s.bypass));
                Ok(map)
            })
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(serde_yaml::to_string(&RawDoc { name: self.name.clone(), stages })?)
    }

    /// Parses YAML, validating every stage's parameters.
    pub fn from_yaml(text: &str) -> PipelineResult<Self> {
        let raw: RawDoc = serde_yaml::from_str(text)?;
        let stages = raw
            .stages
            .into_iter()
            .enumerate()
            .map(|(i, map)| stage_from_mapping(i, map))
            .collect::<PipelineResult<Vec<_>>>()?;
        debug!(name = %raw.name, stages = stages.len(), "parsed pipeline document");
        Ok(Self { name: raw.name, stages })
    }

    /// Writes YAML to `path`.
    pub fn save_file(&self, path: &Path) -> PipelineResult<()> {
        std::fs::write(path, self.to_yaml()?)?;
        debug!(path = %path.display(), "saved pipeline");
        Ok(())
    }

    /// Reads YAML from `path`.
    pub fn load_file(path: &Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}

fn stage_from_mapping(index: usize, mut map: Mapping) -> PipelineResult<StageDoc> {
    let kind = match map.get("type") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(PipelineError::Document(format!(
                "stage {index}: 'type' must be a string, got {other:?}"
            )));
        }
        None => return Err(PipelineError::Document(format!("stage {index}: missing 'type'"))),
    };
    if !StageParams::NAMES.contains(&kind.as_str()) {
        return Err(PipelineError::UnknownStage(kind));
    }
    let bypass = match map.remove("bypass") {
        None => false,
        Some(Value::Bool(b)) => b,
        Some(other) => {
            return Err(PipelineError::Document(format!(
                "stage {index}: 'bypass' must be a boolean, got {other:?}"
            )));
        }
    };
    let params: StageParams = serde_yaml::from_value(Value::Mapping(map))?;
    params
        .validate()
        .map_err(|source| PipelineError::InvalidParams { index, kind: params.kind(), source })?;
    Ok(StageDoc { params, bypass })
}
