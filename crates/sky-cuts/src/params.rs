//! Tunable-parameter metadata for generic editors.
//!
//! Every algorithm publishes a static table of [`ParamSpec`]s. Hosts use it
//! to build parameter forms; [`crate::AutoCuts::from_params`] accepts the
//! resulting loose value map.

use crate::{AutoCutsError, AutoCutsResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value type of a tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// `true` / `false`.
    Bool,
    /// Whole number.
    Int,
    /// Real number.
    Float,
}

/// A loosely typed parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
}

impl ParamValue {
    /// Reads the value as a float. Integers widen.
    pub fn as_f64(&self, name: &str) -> AutoCutsResult<f64> {
        match *self {
            ParamValue::Float(v) => Ok(v),
            ParamValue::Int(v) => Ok(v as f64),
            ParamValue::Bool(_) => Err(type_error(name, "a number")),
        }
    }

    /// Reads the value as a non-negative integer. Integral floats narrow.
    pub fn as_usize(&self, name: &str) -> AutoCutsResult<usize> {
        match *self {
            ParamValue::Int(v) if v >= 0 => Ok(v as usize),
            ParamValue::Float(v) if v >= 0.0 && v.fract() == 0.0 => Ok(v as usize),
            _ => Err(type_error(name, "a non-negative integer")),
        }
    }

    /// Reads the value as a boolean.
    pub fn as_bool(&self, name: &str) -> AutoCutsResult<bool> {
        match *self {
            ParamValue::Bool(v) => Ok(v),
            _ => Err(type_error(name, "a boolean")),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
        }
    }
}

fn type_error(name: &str, expected: &str) -> AutoCutsError {
    AutoCutsError::InvalidParameter(format!("{name} must be {expected}"))
}

/// Static description of one tunable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    /// Field name as used in parameter maps and saved pipelines.
    pub name: &'static str,
    /// Value type.
    pub kind: ParamKind,
    /// Default value.
    pub default: ParamValue,
    /// Inclusive valid range for numeric tunables.
    pub range: Option<(f64, f64)>,
    /// One-line help text.
    pub description: &'static str,
}

pub(crate) const USECROP: ParamSpec = ParamSpec {
    name: "usecrop",
    kind: ParamKind::Bool,
    default: ParamValue::Bool(true),
    range: None,
    description: "Use a center crop of the image for the calculation",
};

pub(crate) const CROP_RADIUS: ParamSpec = ParamSpec {
    name: "crop_radius",
    kind: ParamKind::Int,
    default: ParamValue::Int(512),
    range: Some((16.0, 16384.0)),
    description: "Half-size in pixels of the center crop",
};

pub(crate) const CONTRAST: ParamSpec = ParamSpec {
    name: "contrast",
    kind: ParamKind::Float,
    default: ParamValue::Float(0.25),
    range: Some((0.0, 1.0)),
    description: "Contrast factor; the slope is divided by it (must be > 0)",
};

pub(crate) const NUM_POINTS: ParamSpec = ParamSpec {
    name: "num_points",
    kind: ParamKind::Int,
    default: ParamValue::Int(1000),
    range: Some((1.0, 1.0e7)),
    description: "Number of evenly strided samples to fit",
};

/// Rejects `value` if it lies outside the spec's range.
pub(crate) fn check_range(spec: &ParamSpec, value: f64) -> AutoCutsResult<()> {
    if let Some((lo, hi)) = spec.range {
        if !(lo..=hi).contains(&value) {
            return Err(AutoCutsError::InvalidParameter(format!(
                "{} = {} outside [{}, {}]",
                spec.name, value, lo, hi
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_coercion() {
        assert_eq!(ParamValue::Int(3).as_f64("x").unwrap(), 3.0);
        assert_eq!(ParamValue::Float(4.0).as_usize("x").unwrap(), 4);
        assert!(ParamValue::Float(4.5).as_usize("x").is_err());
        assert!(ParamValue::Int(1).as_bool("x").is_err());
    }

    #[test]
    fn test_check_range() {
        assert!(check_range(&CONTRAST, 0.5).is_ok());
        assert!(check_range(&CONTRAST, 1.5).is_err());
    }
}
