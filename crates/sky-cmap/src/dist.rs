//! Color distribution curves.
//!
//! A distribution maps a data index in `[0, hashsize)` to a color index in
//! `[0, colorlen)` through a fixed curve over the normalized input
//! `x = i / hashsize`:
//!
//! | kind      | curve                       |
//! |-----------|-----------------------------|
//! | linear    | `x`                         |
//! | log       | `ln(a*x + 1) / ln(a)`       |
//! | power     | `(a^x - 1) / a`             |
//! | sqrt      | `sqrt(x)`                   |
//! | squared   | `x^2`                       |
//! | asinh     | `asinh(f*x) / n`            |
//! | sinh      | `sinh(f*x) / n`             |
//! | histeq    | CDF of the input indices    |
//!
//! Curve output is clipped to `[0, 1]`, scaled by `colorlen - 1` and
//! truncated. All curves except `histeq` are tabulated once in
//! [`ColorDist::calc_hash`]; `histeq` depends on the data and rebuilds its
//! table from a full histogram on every [`ColorDist::hash_array`] call.

use crate::{CmapError, CmapResult};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Default number of table entries.
pub const DEFAULT_HASHSIZE: usize = 65536;
/// Default number of output colors.
pub const DEFAULT_COLORLEN: usize = 256;
/// Largest allowed table.
pub const MAX_HASHSIZE: usize = 1024 * 1024;

const PAR_THRESHOLD: usize = 1 << 16;

/// Curve selection and its tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum DistKind {
    /// Identity.
    Linear,
    /// Logarithmic, steepness `exp`.
    Log {
        /// Curve base.
        #[serde(default = "default_exp")]
        exp: f64,
    },
    /// Exponential, base `exp`.
    Power {
        /// Curve base.
        #[serde(default = "default_exp")]
        exp: f64,
    },
    /// Square root.
    Sqrt,
    /// Square.
    Squared,
    /// Inverse hyperbolic sine.
    Asinh {
        /// Input scale.
        #[serde(default = "default_asinh_factor")]
        factor: f64,
        /// Output divisor.
        #[serde(default = "default_asinh_nonlinearity")]
        nonlinearity: f64,
    },
    /// Hyperbolic sine.
    Sinh {
        /// Input scale.
        #[serde(default = "default_sinh_factor")]
        factor: f64,
        /// Output divisor.
        #[serde(default = "default_sinh_nonlinearity")]
        nonlinearity: f64,
    },
    /// Histogram equalization.
    Histeq,
}

fn default_exp() -> f64 {
    1000.0
}
fn default_asinh_factor() -> f64 {
    10.0
}
fn default_asinh_nonlinearity() -> f64 {
    3.0
}
fn default_sinh_factor() -> f64 {
    3.0
}
fn default_sinh_nonlinearity() -> f64 {
    10.0
}

impl Default for DistKind {
    fn default() -> Self {
        DistKind::Linear
    }
}

impl DistKind {
    /// Registered names.
    pub const NAMES: [&'static str; 8] =
        ["linear", "log", "power", "sqrt", "squared", "asinh", "sinh", "histeq"];

    /// Curve `name` with default tunables.
    pub fn from_name(name: &str) -> CmapResult<Self> {
        Ok(match name.to_ascii_lowercase().as_str() {
            "linear" => DistKind::Linear,
            "log" => DistKind::Log { exp: default_exp() },
            "power" => DistKind::Power { exp: default_exp() },
            "sqrt" => DistKind::Sqrt,
            "squared" => DistKind::Squared,
            "asinh" => DistKind::Asinh {
                factor: default_asinh_factor(),
                nonlinearity: default_asinh_nonlinearity(),
            },
            "sinh" => DistKind::Sinh {
                factor: default_sinh_factor(),
                nonlinearity: default_sinh_nonlinearity(),
            },
            "histeq" => DistKind::Histeq,
            _ => {
                return Err(CmapError::UnknownMap { kind: "distribution", name: name.to_string() });
            }
        })
    }

    /// Registered name.
    pub fn name(&self) -> &'static str {
        match self {
            DistKind::Linear => "linear",
            DistKind::Log { .. } => "log",
            DistKind::Power { .. } => "power",
            DistKind::Sqrt => "sqrt",
            DistKind::Squared => "squared",
            DistKind::Asinh { .. } => "asinh",
            DistKind::Sinh { .. } => "sinh",
            DistKind::Histeq => "histeq",
        }
    }

    /// Forward curve on `[0, 1]`, unclipped.
    pub fn forward(&self, x: f64) -> f64 {
        match *self {
            DistKind::Linear | DistKind::Histeq => x,
            DistKind::Log { exp } => (exp * x + 1.0).ln() / exp.ln(),
            DistKind::Power { exp } => (exp.powf(x) - 1.0) / exp,
            DistKind::Sqrt => x.sqrt(),
            DistKind::Squared => x * x,
            DistKind::Asinh { factor, nonlinearity } => (factor * x).asinh() / nonlinearity,
            DistKind::Sinh { factor, nonlinearity } => (factor * x).sinh() / nonlinearity,
        }
    }

    /// Inverse of [`Self::forward`].
    pub fn inverse(&self, y: f64) -> f64 {
        match *self {
            DistKind::Linear | DistKind::Histeq => y,
            DistKind::Log { exp } => (exp.powf(y) - 1.0) / exp,
            DistKind::Power { exp } => (exp * y + 1.0).ln() / exp.ln(),
            DistKind::Sqrt => y * y,
            DistKind::Squared => y.max(0.0).sqrt(),
            DistKind::Asinh { factor, nonlinearity } => (nonlinearity * y).sinh() / factor,
            DistKind::Sinh { factor, nonlinearity } => (nonlinearity * y).asinh() / factor,
        }
    }

    /// Checks curve tunables.
    pub fn validate(&self) -> CmapResult<()> {
        let bad = match *self {
            DistKind::Log { exp } | DistKind::Power { exp } => !(exp > 1.0 && exp.is_finite()),
            DistKind::Asinh { factor, nonlinearity } | DistKind::Sinh { factor, nonlinearity } => {
                !(factor > 0.0 && nonlinearity > 0.0)
            }
            _ => false,
        };
        if bad {
            return Err(CmapError::InvalidParameter(format!("bad {} curve parameters", self.name())));
        }
        Ok(())
    }
}

/// A tabulated distribution curve.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorDist {
    kind: DistKind,
    hashsize: usize,
    colorlen: usize,
    hash: Vec<u32>,
}

impl ColorDist {
    /// Builds and tabulates a distribution.
    ///
    /// ```rust
    /// use sky_cmap::dist::{ColorDist, DistKind};
    ///
    /// let dist = ColorDist::new(DistKind::Sqrt, 65536, 256).unwrap();
    /// assert_eq!(dist.hash_value(0), 0);
    /// assert_eq!(dist.hash_value(16384), 127);
    /// ```
    pub fn new(kind: DistKind, hashsize: usize, colorlen: usize) -> CmapResult<Self> {
        kind.validate()?;
        check_hash_size(hashsize, colorlen)?;
        let mut dist = Self { kind, hashsize, colorlen, hash: Vec::new() };
        dist.calc_hash();
        Ok(dist)
    }

    /// Curve.
    pub fn kind(&self) -> DistKind {
        self.kind
    }

    /// Returns `true` when the mapping depends on the data being mapped.
    pub fn is_data_dependent(&self) -> bool {
        matches!(self.kind, DistKind::Histeq)
    }

    /// Recomputes the table from the curve.
    pub fn calc_hash(&mut self) {
        let n = self.hashsize as f64;
        let top = (self.colorlen - 1) as f64;
        let kind = self.kind;
        self.hash = (0..self.hashsize)
            .map(|i| (kind.forward(i as f64 / n).clamp(0.0, 1.0) * top) as u32)
            .collect();
        trace!(dist = kind.name(), hashsize = self.hashsize, colorlen = self.colorlen, "calc_hash");
    }

    /// The table.
    pub fn table(&self) -> &[u32] {
        &self.hash
    }

    /// Table lookup of one index, clipped to the table.
    pub fn hash_value(&self, idx: i64) -> u32 {
        self.hash[idx.clamp(0, self.hashsize as i64 - 1) as usize]
    }

    /// Maps an index array through the distribution.
    ///
    /// Indices are clipped to `[0, hashsize - 1]`. For `histeq` a table is
    /// first built from the CDF of `idx`.
    pub fn hash_array(&self, idx: &[u32]) -> Vec<u32> {
        let last = self.hashsize - 1;
        let table = if self.is_data_dependent() {
            std::borrow::Cow::Owned(self.equalize(idx))
        } else {
            std::borrow::Cow::Borrowed(&self.hash)
        };
        gather(idx, |i| table[(i as usize).min(last)])
    }

    fn equalize(&self, idx: &[u32]) -> Vec<u32> {
        let last = self.hashsize - 1;
        let mut hist = vec![0u64; self.hashsize];
        for &i in idx {
            hist[(i as usize).min(last)] += 1;
        }
        let total = idx.len().max(1) as f64;
        let top = (self.colorlen - 1) as f64;
        let mut cum = 0u64;
        let table = hist
            .iter()
            .map(|&h| {
                cum += h;
                ((cum as f64 / total).clamp(0.0, 1.0) * top) as u32
            })
            .collect();
        debug!(hashsize = self.hashsize, samples = idx.len(), "histeq table rebuilt");
        table
    }

    /// Fraction of the input range that maps to output fraction `pct`.
    pub fn get_dist_pct(&self, pct: f64) -> f64 {
        self.kind.inverse(pct).clamp(0.0, 1.0)
    }

    /// Changes the table size and re-tabulates.
    pub fn set_hash_size(&mut self, size: usize) -> CmapResult<()> {
        check_hash_size(size, self.colorlen)?;
        self.hashsize = size;
        self.calc_hash();
        Ok(())
    }

    /// Table size.
    pub fn get_hash_size(&self) -> usize {
        self.hashsize
    }

    /// Number of output colors.
    pub fn colorlen(&self) -> usize {
        self.colorlen
    }

    /// Changes the number of output colors and re-tabulates.
    pub fn set_colorlen(&mut self, colorlen: usize) -> CmapResult<()> {
        check_hash_size(self.hashsize, colorlen)?;
        self.colorlen = colorlen;
        self.calc_hash();
        Ok(())
    }
}

fn check_hash_size(size: usize, colorlen: usize) -> CmapResult<()> {
    if colorlen < 2 || size < colorlen || size > MAX_HASHSIZE {
        return Err(CmapError::InvalidHashSize { size, min: colorlen, max: MAX_HASHSIZE });
    }
    Ok(())
}

#[cfg(feature = "parallel")]
fn gather<F: Fn(u32) -> u32 + Sync>(idx: &[u32], f: F) -> Vec<u32> {
    if idx.len() >= PAR_THRESHOLD {
        idx.par_iter().map(|&i| f(i)).collect()
    } else {
        idx.iter().map(|&i| f(i)).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn gather<F: Fn(u32) -> u32>(idx: &[u32], f: F) -> Vec<u32> {
    let _ = PAR_THRESHOLD;
    idx.iter().map(|&i| f(i)).collect()
}
