//! Color maps and intensity maps.
//!
//! A [`ColorMap`] is a table of RGB triples in `[0, 1]`; an
//! [`IntensityMap`] is a table of scalars in `[0, 1]` that remaps color
//! indices before the color lookup. Both are usually loaded from external
//! tables with `from_table`; a small set of procedural builtins is provided
//! for hosts without their own tables.

use crate::{CmapError, CmapResult};
use serde::{Deserialize, Serialize};

/// Length of the builtin tables.
pub const TABLE_LEN: usize = 256;

/// Named RGB table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMap {
    /// Name.
    pub name: String,
    /// RGB entries, `[0, 1]`.
    pub clst: Vec<[f32; 3]>,
}

/// Named scalar table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityMap {
    /// Name.
    pub name: String,
    /// Entries, `[0, 1]`.
    pub ilst: Vec<f32>,
}

fn ramp(n: usize) -> impl Iterator<Item = f32> {
    (0..n).map(move |i| i as f32 / (n - 1) as f32)
}

fn stairs(x: f32, steps: f32) -> f32 {
    ((x * steps).floor() / (steps - 1.0)).min(1.0)
}

impl ColorMap {
    /// Names of the builtin color maps.
    pub const BUILTINS: [&'static str; 8] =
        ["gray", "red", "green", "blue", "heat", "cool", "rainbow", "stairs8"];

    /// Wraps an external table.
    pub fn from_table(name: &str, clst: Vec<[f32; 3]>) -> CmapResult<Self> {
        if clst.len() < 2 {
            return Err(CmapError::InvalidTable(format!("{name}: need at least 2 entries")));
        }
        if clst.iter().flatten().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(CmapError::InvalidTable(format!("{name}: values must be in [0, 1]")));
        }
        Ok(Self { name: name.to_string(), clst })
    }

    /// Procedural builtin by name.
    pub fn builtin(name: &str) -> CmapResult<Self> {
        let f: fn(f32) -> [f32; 3] = match name {
            "gray" => |x| [x, x, x],
            "red" => |x| [x, 0.0, 0.0],
            "green" => |x| [0.0, x, 0.0],
            "blue" => |x| [0.0, 0.0, x],
            "heat" => |x| {
                [(3.0 * x).min(1.0), (3.0 * x - 1.0).clamp(0.0, 1.0), (3.0 * x - 2.0).clamp(0.0, 1.0)]
            },
            "cool" => |x| [x, 1.0 - x, 1.0],
            "rainbow" => |x| hue_to_rgb((1.0 - x) * 2.0 / 3.0),
            "stairs8" => |x| {
                let v = stairs(x, 8.0);
                [v, v, v]
            },
            _ => return Err(CmapError::UnknownMap { kind: "color map", name: name.to_string() }),
        };
        Ok(Self { name: name.to_string(), clst: ramp(TABLE_LEN).map(f).collect() })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.clst.len()
    }

    /// Returns `true` for an empty table.
    pub fn is_empty(&self) -> bool {
        self.clst.is_empty()
    }

    /// Table resampled by nearest neighbor to `n` entries, scaled to
    /// `[0, maxc]`.
    pub fn resampled(&self, n: usize, maxc: f32) -> Vec<[f32; 3]> {
        resample(&self.clst, n).into_iter().map(|c| c.map(|v| v * maxc)).collect()
    }
}

impl IntensityMap {
    /// Names of the builtin intensity maps.
    pub const BUILTINS: [&'static str; 8] =
        ["ramp", "neg", "log", "neglog", "expo", "gamma", "null", "stairs"];

    /// Wraps an external table.
    pub fn from_table(name: &str, ilst: Vec<f32>) -> CmapResult<Self> {
        if ilst.len() < 2 {
            return Err(CmapError::InvalidTable(format!("{name}: need at least 2 entries")));
        }
        if ilst.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(CmapError::InvalidTable(format!("{name}: values must be in [0, 1]")));
        }
        Ok(Self { name: name.to_string(), ilst })
    }

    /// Procedural builtin by name.
    pub fn builtin(name: &str) -> CmapResult<Self> {
        let log = |x: f32| (1.0 + 1000.0 * x).ln() / 1001f32.ln();
        let ilst: Vec<f32> = match name {
            "ramp" | "null" => ramp(TABLE_LEN).collect(),
            "neg" => ramp(TABLE_LEN).map(|x| 1.0 - x).collect(),
            "log" => ramp(TABLE_LEN).map(log).collect(),
            "neglog" => ramp(TABLE_LEN).map(|x| 1.0 - log(x)).collect(),
            "expo" => ramp(TABLE_LEN).map(|x| (1000f32.powf(x) - 1.0) / 999.0).collect(),
            "gamma" => ramp(TABLE_LEN).map(|x| x.powf(1.0 / 2.2)).collect(),
            "stairs" => ramp(TABLE_LEN).map(|x| stairs(x, 8.0)).collect(),
            _ => {
                return Err(CmapError::UnknownMap { kind: "intensity map", name: name.to_string() });
            }
        };
        Ok(Self { name: name.to_string(), ilst })
    }

    /// Table resampled to `n` entries and converted to indices in `[0, n)`.
    pub fn index_table(&self, n: usize) -> Vec<u32> {
        let top = (n - 1) as f32;
        resample(&self.ilst, n)
            .into_iter()
            .map(|v| (v.clamp(0.0, 1.0) * top).round() as u32)
            .collect()
    }
}

fn resample<T: Copy>(src: &[T], n: usize) -> Vec<T> {
    if src.len() == n {
        return src.to_vec();
    }
    let m = src.len();
    (0..n)
        .map(|i| {
            let j = if n > 1 { (i * (m - 1) + (n - 1) / 2) / (n - 1) } else { 0 };
            src[j.min(m - 1)]
        })
        .collect()
}

fn hue_to_rgb(h: f32) -> [f32; 3] {
    let h6 = (h.rem_euclid(1.0)) * 6.0;
    let c = |offset: f32| {
        let k = (offset + h6).rem_euclid(6.0);
        1.0 - k.min(4.0 - k).clamp(0.0, 1.0)
    };
    [c(5.0), c(3.0), c(1.0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_valid() {
        for name in ColorMap::BUILTINS {
            let cm = ColorMap::builtin(name).unwrap();
            assert_eq!(cm.len(), TABLE_LEN);
            assert!(ColorMap::from_table(name, cm.clst.clone()).is_ok(), "{name}");
        }
        for name in IntensityMap::BUILTINS {
            let im = IntensityMap::builtin(name).unwrap();
            assert!(IntensityMap::from_table(name, im.ilst.clone()).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_gray_endpoints() {
        let cm = ColorMap::builtin("gray").unwrap();
        assert_eq!(cm.clst[0], [0.0, 0.0, 0.0]);
        assert_eq!(cm.clst[255], [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_rainbow_ends() {
        let cm = ColorMap::builtin("rainbow").unwrap();
        let first = cm.clst[0];
        let last = cm.clst[255];
        assert!(first[2] > 0.99 && first[0] < 0.01);
        assert!(last[0] > 0.99 && last[2] < 0.01);
    }

    #[test]
    fn test_resample() {
        assert_eq!(resample(&[0, 1], 4), vec![0, 0, 1, 1]);
        assert_eq!(resample(&[0, 1, 2, 3], 2), vec![0, 3]);
    }

    #[test]
    fn test_index_table_identity() {
        let im = IntensityMap::builtin("ramp").unwrap();
        let t = im.index_table(256);
        assert!(t.iter().enumerate().all(|(i, &v)| v == i as u32));
    }

    #[test]
    fn test_bad_tables() {
        assert!(ColorMap::from_table("x", vec![[0.0; 3]]).is_err());
        assert!(IntensityMap::from_table("x", vec![0.0, 1.5]).is_err());
        assert!(ColorMap::builtin("nope").is_err());
    }
}
