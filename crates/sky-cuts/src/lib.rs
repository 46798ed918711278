//! # sky-cuts
//!
//! Automatic cut-level algorithms for astronomical images.
//!
//! Every algorithm computes a `(lo, hi)` pair of data values; applying the
//! levels with [`levels::cut_levels`] rescales the data linearly into an
//! output range.
//!
//! # Algorithms
//!
//! - [`Minmax`] / [`Clip`] - finite data min/max
//! - [`Histogram`] - keep a central percentile of pixels
//! - [`StdDev`] - mean plus scaled standard deviations
//! - [`MedianFilter`] - min/max of a median-filtered sample
//! - [`ZScale`] / [`ZScale2`] - robust line fit to sorted samples
//!
//! # Example
//!
//! ```rust
//! use sky_core::PixelBuffer;
//! use sky_cuts::AutoCuts;
//!
//! let img = PixelBuffer::mono(4, 1, vec![0.0, 10.0, 20.0, 1000.0]).unwrap();
//! let algo = AutoCuts::default_for("minmax").unwrap();
//! let (lo, hi) = algo.calc_cut_levels(&img).unwrap();
//! assert_eq!((lo, hi), (0.0, 1000.0));
//! let out = algo.cut_levels(&img.data, lo, hi, 0.0, 255.0);
//! assert_eq!(out[3], 255.0);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod histogram;
pub mod levels;
pub mod lm;
pub mod median;
pub mod minmax;
pub mod params;
pub mod stats;
pub mod stddev;
pub mod zscale;

use serde::{Deserialize, Serialize};
use sky_core::{ImageSource, PixelBuffer};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

pub use error::{AutoCutsError, AutoCutsResult};
pub use histogram::Histogram;
pub use median::MedianFilter;
pub use minmax::{Clip, Minmax};
pub use params::{ParamKind, ParamSpec, ParamValue};
pub use stddev::StdDev;
pub use zscale::{ZScale, ZScale2};

/// Common interface of the cut-level algorithms.
pub trait CutLevels {
    /// Checks the tunables.
    fn validate(&self) -> AutoCutsResult<()> {
        Ok(())
    }

    /// Cut levels of single-band pixel data.
    ///
    /// Fails with [`AutoCutsError::InvalidInput`] for multi-channel or
    /// malformed buffers.
    fn calc_cuts_from_data(&self, data: &PixelBuffer) -> AutoCutsResult<(f64, f64)>;

    /// Cut levels of an image. Color images are reduced to luminance.
    fn calc_cut_levels(&self, image: &dyn ImageSource) -> AutoCutsResult<(f64, f64)> {
        self.calc_cuts_from_data(&single_band(image.get_data()))
    }

    /// Maps `data` through the levels into `[vmin, vmax]`.
    fn cut_levels(&self, data: &[f32], lo: f64, hi: f64, vmin: f64, vmax: f64) -> Vec<f32> {
        levels::cut_levels(data, lo, hi, vmin, vmax)
    }
}

/// Rejects multi-channel and inconsistent buffers.
pub(crate) fn check_input(data: &PixelBuffer) -> AutoCutsResult<()> {
    if data.channels != 1 {
        return Err(AutoCutsError::InvalidInput(format!(
            "expected 2D single-band data, got {} channels",
            data.channels
        )));
    }
    if data.data.is_empty() || data.data.len() != data.width * data.height {
        return Err(AutoCutsError::InvalidInput(format!(
            "{} samples for a {}x{} image",
            data.data.len(),
            data.width,
            data.height
        )));
    }
    Ok(())
}

/// Borrows mono data, reduces color data to luminance.
pub(crate) fn single_band(data: &PixelBuffer) -> Cow<'_, PixelBuffer> {
    if data.is_mono() { Cow::Borrowed(data) } else { Cow::Owned(data.to_luma()) }
}

/// Center crop of half-size `radius`, or the whole buffer when fewer than
/// half of the crop's pixels are finite.
pub(crate) fn crop_or_full(data: &PixelBuffer, radius: usize) -> Cow<'_, PixelBuffer> {
    let (w, h) = data.size();
    if let Ok(cut) = data.cutout_radius(w / 2, h / 2, radius) {
        let finite = cut.data.data.iter().filter(|v| v.is_finite()).count();
        if finite * 2 >= cut.data.data.len() {
            return Cow::Owned(cut.data);
        }
        tracing::debug!(finite, total = cut.data.data.len(), "crop mostly non-finite, using full image");
    }
    Cow::Borrowed(data)
}

/// Registered algorithm names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoCutsKind {
    /// [`Minmax`]
    Minmax,
    /// [`Clip`]
    Clip,
    /// [`Histogram`]
    Histogram,
    /// [`StdDev`]
    StdDev,
    /// [`MedianFilter`]
    Median,
    /// [`ZScale`]
    ZScale,
    /// [`ZScale2`]
    ZScale2,
}

impl AutoCutsKind {
    /// All kinds, in menu order.
    pub const ALL: [AutoCutsKind; 7] = [
        AutoCutsKind::Minmax,
        AutoCutsKind::Clip,
        AutoCutsKind::Histogram,
        AutoCutsKind::StdDev,
        AutoCutsKind::Median,
        AutoCutsKind::ZScale,
        AutoCutsKind::ZScale2,
    ];

    /// Registry name.
    pub fn name(self) -> &'static str {
        match self {
            AutoCutsKind::Minmax => "minmax",
            AutoCutsKind::Clip => "clip",
            AutoCutsKind::Histogram => "histogram",
            AutoCutsKind::StdDev => "stddev",
            AutoCutsKind::Median => "median",
            AutoCutsKind::ZScale => "zscale",
            AutoCutsKind::ZScale2 => "zscale2",
        }
    }

    /// Looks a kind up by name, case-insensitively.
    pub fn from_name(name: &str) -> AutoCutsResult<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| AutoCutsError::UnknownAlgorithm(name.to_string()))
    }

    /// Tunables of this algorithm.
    pub fn param_specs(self) -> &'static [ParamSpec] {
        match self {
            AutoCutsKind::Minmax | AutoCutsKind::Clip => &[],
            AutoCutsKind::Histogram => histogram::PARAMS,
            AutoCutsKind::StdDev => stddev::PARAMS,
            AutoCutsKind::Median => median::PARAMS,
            AutoCutsKind::ZScale | AutoCutsKind::ZScale2 => zscale::PARAMS,
        }
    }

    /// Algorithm with default tunables.
    pub fn default_algorithm(self) -> AutoCuts {
        match self {
            AutoCutsKind::Minmax => AutoCuts::Minmax,
            AutoCutsKind::Clip => AutoCuts::Clip,
            AutoCutsKind::Histogram => AutoCuts::Histogram(Histogram::default()),
            AutoCutsKind::StdDev => AutoCuts::StdDev(StdDev::default()),
            AutoCutsKind::Median => AutoCuts::Median(MedianFilter::default()),
            AutoCutsKind::ZScale => AutoCuts::ZScale(ZScale::default()),
            AutoCutsKind::ZScale2 => AutoCuts::ZScale2(ZScale2::default()),
        }
    }
}

impl fmt::Display for AutoCutsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configured cut-level algorithm.
///
/// Serializes as a map tagged by `name`, e.g.
/// `{name: histogram, pct: 0.99, numbins: 2048, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum AutoCuts {
    /// Data min/max.
    #[serde(rename = "minmax")]
    Minmax,
    /// Data min/max, clamp only.
    #[serde(rename = "clip")]
    Clip,
    /// Histogram percentile.
    #[serde(rename = "histogram")]
    Histogram(Histogram),
    /// Standard deviation.
    #[serde(rename = "stddev")]
    StdDev(StdDev),
    /// Median filter.
    #[serde(rename = "median")]
    Median(MedianFilter),
    /// IRAF zscale.
    #[serde(rename = "zscale")]
    ZScale(ZScale),
    /// zscale with a Levenberg-Marquardt fit.
    #[serde(rename = "zscale2")]
    ZScale2(ZScale2),
}

impl Default for AutoCuts {
    fn default() -> Self {
        AutoCuts::Histogram(Histogram::default())
    }
}

impl AutoCuts {
    /// Algorithm `name` with default tunables.
    pub fn default_for(name: &str) -> AutoCutsResult<Self> {
        Ok(AutoCutsKind::from_name(name)?.default_algorithm())
    }

    /// Builds an algorithm from a name and a loose parameter map.
    ///
    /// Missing parameters keep their defaults; unknown names or values of
    /// the wrong type are rejected, and the result is validated.
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use sky_cuts::{AutoCuts, ParamValue};
    ///
    /// let mut params = BTreeMap::new();
    /// params.insert("contrast".to_string(), ParamValue::Float(0.5));
    /// let algo = AutoCuts::from_params("zscale", &params).unwrap();
    /// assert_eq!(algo.params()["contrast"], ParamValue::Float(0.5));
    ///
    /// params.insert("contrast".to_string(), ParamValue::Float(0.0));
    /// assert!(AutoCuts::from_params("zscale", &params).is_err());
    /// ```
    pub fn from_params(name: &str, params: &BTreeMap<String, ParamValue>) -> AutoCutsResult<Self> {
        let mut algo = Self::default_for(name)?;
        for (key, value) in params {
            algo.set_param(key, *value)?;
        }
        algo.validate()?;
        Ok(algo)
    }

    /// Kind of this algorithm.
    pub fn kind(&self) -> AutoCutsKind {
        match self {
            AutoCuts::Minmax => AutoCutsKind::Minmax,
            AutoCuts::Clip => AutoCutsKind::Clip,
            AutoCuts::Histogram(_) => AutoCutsKind::Histogram,
            AutoCuts::StdDev(_) => AutoCutsKind::StdDev,
            AutoCuts::Median(_) => AutoCutsKind::Median,
            AutoCuts::ZScale(_) => AutoCutsKind::ZScale,
            AutoCuts::ZScale2(_) => AutoCutsKind::ZScale2,
        }
    }

    /// Registry name.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn algorithm(&self) -> &dyn CutLevels {
        match self {
            AutoCuts::Minmax => &Minmax,
            AutoCuts::Clip => &Clip,
            AutoCuts::Histogram(a) => a,
            AutoCuts::StdDev(a) => a,
            AutoCuts::Median(a) => a,
            AutoCuts::ZScale(a) => a,
            AutoCuts::ZScale2(a) => a,
        }
    }

    /// Sets one tunable by name.
    pub fn set_param(&mut self, key: &str, value: ParamValue) -> AutoCutsResult<()> {
        match (self, key) {
            (AutoCuts::Histogram(a), "pct") => a.pct = value.as_f64(key)?,
            (AutoCuts::Histogram(a), "numbins") => a.numbins = value.as_usize(key)?,
            (AutoCuts::Histogram(a), "usecrop") => a.usecrop = value.as_bool(key)?,
            (AutoCuts::Histogram(a), "crop_radius") => a.crop_radius = value.as_usize(key)?,
            (AutoCuts::StdDev(a), "hensa_lo") => a.hensa_lo = value.as_f64(key)?,
            (AutoCuts::StdDev(a), "hensa_hi") => a.hensa_hi = value.as_f64(key)?,
            (AutoCuts::StdDev(a), "usecrop") => a.usecrop = value.as_bool(key)?,
            (AutoCuts::StdDev(a), "crop_radius") => a.crop_radius = value.as_usize(key)?,
            (AutoCuts::Median(a), "num_points") => a.num_points = value.as_usize(key)?,
            (AutoCuts::Median(a), "length") => a.length = value.as_usize(key)?,
            (AutoCuts::ZScale(a), "contrast") => a.contrast = value.as_f64(key)?,
            (AutoCuts::ZScale(a), "num_points") => a.num_points = value.as_usize(key)?,
            (AutoCuts::ZScale2(a), "contrast") => a.contrast = value.as_f64(key)?,
            (AutoCuts::ZScale2(a), "num_points") => a.num_points = value.as_usize(key)?,
            (algo, _) => {
                return Err(AutoCutsError::InvalidParameter(format!(
                    "{} has no parameter '{key}'",
                    algo.name()
                )));
            }
        }
        Ok(())
    }

    /// Current tunables as a loose map.
    pub fn params(&self) -> BTreeMap<String, ParamValue> {
        let pairs: Vec<(&str, ParamValue)> = match self {
            AutoCuts::Minmax | AutoCuts::Clip => vec![],
            AutoCuts::Histogram(a) => vec![
                ("pct", ParamValue::Float(a.pct)),
                ("numbins", ParamValue::Int(a.numbins as i64)),
                ("usecrop", ParamValue::Bool(a.usecrop)),
                ("crop_radius", ParamValue::Int(a.crop_radius as i64)),
            ],
            AutoCuts::StdDev(a) => vec![
                ("hensa_lo", ParamValue::Float(a.hensa_lo)),
                ("hensa_hi", ParamValue::Float(a.hensa_hi)),
                ("usecrop", ParamValue::Bool(a.usecrop)),
                ("crop_radius", ParamValue::Int(a.crop_radius as i64)),
            ],
            AutoCuts::Median(a) => vec![
                ("num_points", ParamValue::Int(a.num_points as i64)),
                ("length", ParamValue::Int(a.length as i64)),
            ],
            AutoCuts::ZScale(ZScale { contrast, num_points })
            | AutoCuts::ZScale2(ZScale2 { contrast, num_points }) => vec![
                ("contrast", ParamValue::Float(*contrast)),
                ("num_points", ParamValue::Int(*num_points as i64)),
            ],
        };
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    /// Checks the tunables.
    pub fn validate(&self) -> AutoCutsResult<()> {
        self.algorithm().validate()
    }

    /// See [`CutLevels::calc_cut_levels`].
    pub fn calc_cut_levels(&self, image: &dyn ImageSource) -> AutoCutsResult<(f64, f64)> {
        self.algorithm().calc_cut_levels(image)
    }

    /// See [`CutLevels::calc_cuts_from_data`].
    pub fn calc_cuts_from_data(&self, data: &PixelBuffer) -> AutoCutsResult<(f64, f64)> {
        self.algorithm().calc_cuts_from_data(data)
    }

    /// See [`CutLevels::cut_levels`].
    pub fn cut_levels(&self, data: &[f32], lo: f64, hi: f64, vmin: f64, vmax: f64) -> Vec<f32> {
        self.algorithm().cut_levels(data, lo, hi, vmin, vmax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names() {
        for kind in AutoCutsKind::ALL {
            assert_eq!(AutoCutsKind::from_name(kind.name()).unwrap(), kind);
            assert_eq!(kind.default_algorithm().kind(), kind);
        }
        assert!(matches!(
            AutoCutsKind::from_name("nope"),
            Err(AutoCutsError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn test_params_roundtrip() {
        for kind in AutoCutsKind::ALL {
            let algo = kind.default_algorithm();
            let rebuilt = AutoCuts::from_params(kind.name(), &algo.params()).unwrap();
            assert_eq!(rebuilt, algo);
        }
    }

    #[test]
    fn test_specs_match_defaults() {
        for kind in AutoCutsKind::ALL {
            let params = kind.default_algorithm().params();
            assert_eq!(params.len(), kind.param_specs().len());
            for spec in kind.param_specs() {
                assert_eq!(params[spec.name], spec.default, "{}.{}", kind, spec.name);
            }
        }
    }

    #[test]
    fn test_unknown_param() {
        let mut params = BTreeMap::new();
        params.insert("bogus".to_string(), ParamValue::Int(1));
        assert!(AutoCuts::from_params("histogram", &params).is_err());
        assert!(AutoCuts::from_params("minmax", &params).is_err());
    }

    #[test]
    fn test_yaml_tagged() {
        let algo: AutoCuts = serde_yaml::from_str("name: histogram\npct: 0.9\n").unwrap();
        assert_eq!(algo, AutoCuts::Histogram(Histogram { pct: 0.9, ..Default::default() }));
        let algo: AutoCuts = serde_yaml::from_str("name: minmax\n").unwrap();
        assert_eq!(algo, AutoCuts::Minmax);
    }

    #[test]
    fn test_color_image_uses_luma() {
        let img = PixelBuffer::new(2, 1, 3, sky_core::BitDepth::F32, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
            .unwrap();
        let (lo, hi) = AutoCuts::Minmax.calc_cut_levels(&img).unwrap();
        assert!((lo - 0.0).abs() < 1e-6 && (hi - 1.0).abs() < 1e-6);
    }
}
