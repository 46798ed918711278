//! Index-to-RGB mapper with a precomputed lookup cache.
//!
//! Mapping runs four phases per data index:
//!
//! ```text
//! index --dist--> color idx --shift--> color idx --imap--> color idx --cmap--> RGB
//! ```
//!
//! All four are folded into one `(hashsize + 1)`-entry cache so mapping an
//! image is a single gather per pixel. Each setter rebuilds only the table
//! it owns and then refreshes the cache from the stored distribution output,
//! so the distribution is only re-tabulated when it or the hash size
//! changes. Histogram equalization depends on the data and bypasses the
//! cache.

use crate::dist::{ColorDist, DEFAULT_HASHSIZE, DistKind};
use crate::maps::{ColorMap, IntensityMap};
use crate::shift::shift_array;
use crate::{CmapError, CmapResult};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sky_core::{BitDepth, ChannelOrder, PixelBuffer};
use tracing::{debug, trace};

/// Serializable mapper configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperSettings {
    /// Distribution curve.
    pub dist: DistKind,
    /// Distribution table size.
    pub hashsize: usize,
    /// Color map name.
    pub color_map: String,
    /// Intensity map name.
    pub intensity_map: String,
    /// Reverse the color map.
    pub invert: bool,
    /// Cyclic color map rotation as a fraction of its length.
    pub rotate_pct: f64,
    /// Contrast percentage, 0.5 neutral.
    pub contrast: f64,
    /// Brightness percentage, 0.5 neutral.
    pub brightness: f64,
    /// Output bits per sample (8 or 16).
    pub bpp: u32,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            dist: DistKind::Linear,
            hashsize: DEFAULT_HASHSIZE,
            color_map: "gray".into(),
            intensity_map: "ramp".into(),
            invert: false,
            rotate_pct: 0.0,
            contrast: 0.5,
            brightness: 0.5,
            bpp: 8,
        }
    }
}

/// Distribution, shift, intensity and color stages plus their cache.
#[derive(Debug, Clone)]
pub struct RgbMapper {
    bpp: u32,
    maxc: u32,
    dist: ColorDist,
    cmap: ColorMap,
    imap: IntensityMap,
    invert: bool,
    rotate_pct: f64,
    contrast: f64,
    brightness: f64,
    // phase tables
    dist_out: Vec<u32>,
    sarr: Vec<u32>,
    iarr: Vec<u32>,
    carr: Vec<[u16; 3]>,
    cache: Vec<[u16; 3]>,
}

impl RgbMapper {
    /// Mapper with default settings and `bpp` output bits (8 or 16).
    pub fn new(bpp: u32) -> CmapResult<Self> {
        let settings = MapperSettings { bpp, ..Default::default() };
        Self::from_settings(&settings)
    }

    /// Mapper from a settings bundle. Map names must be builtins.
    pub fn from_settings(settings: &MapperSettings) -> CmapResult<Self> {
        let maxc = maxc_for(settings.bpp)?;
        let colorlen = maxc as usize + 1;
        let mut mapper = Self {
            bpp: settings.bpp,
            maxc,
            dist: ColorDist::new(settings.dist, settings.hashsize, colorlen)?,
            cmap: ColorMap::builtin(&settings.color_map)?,
            imap: IntensityMap::builtin(&settings.intensity_map)?,
            invert: settings.invert,
            rotate_pct: settings.rotate_pct,
            contrast: settings.contrast.clamp(0.0, 1.0),
            brightness: settings.brightness.clamp(0.0, 1.0),
            dist_out: Vec::new(),
            sarr: Vec::new(),
            iarr: Vec::new(),
            carr: Vec::new(),
            cache: Vec::new(),
        };
        mapper.recalc_all();
        Ok(mapper)
    }

    /// Current settings.
    pub fn settings(&self) -> MapperSettings {
        MapperSettings {
            dist: self.dist.kind(),
            hashsize: self.dist.get_hash_size(),
            color_map: self.cmap.name.clone(),
            intensity_map: self.imap.name.clone(),
            invert: self.invert,
            rotate_pct: self.rotate_pct,
            contrast: self.contrast,
            brightness: self.brightness,
            bpp: self.bpp,
        }
    }

    /// Applies only the settings that differ. Returns `true` if anything
    /// changed.
    ///
    /// Map names matching the current map are kept as-is, so externally
    /// loaded tables survive.
    pub fn apply_settings(&mut self, s: &MapperSettings) -> CmapResult<bool> {
        if s.bpp != self.bpp {
            *self = Self::from_settings(s)?;
            return Ok(true);
        }
        let mut changed = false;
        changed |= self.set_dist(s.dist)?;
        changed |= self.set_hash_size(s.hashsize)?;
        if s.color_map != self.cmap.name {
            changed |= self.set_cmap(ColorMap::builtin(&s.color_map)?);
        }
        if s.intensity_map != self.imap.name {
            changed |= self.set_imap(IntensityMap::builtin(&s.intensity_map)?);
        }
        changed |= self.set_invert(s.invert);
        changed |= self.rotate_cmap(s.rotate_pct);
        changed |= self.set_contrast(s.contrast);
        changed |= self.set_brightness(s.brightness);
        Ok(changed)
    }

    /// Largest output value.
    pub fn maxc(&self) -> u32 {
        self.maxc
    }

    /// Number of colors.
    pub fn colorlen(&self) -> usize {
        self.maxc as usize + 1
    }

    /// Output bits per sample.
    pub fn bpp(&self) -> u32 {
        self.bpp
    }

    // ---- setters -------------------------------------------------------

    /// Replaces the color map.
    pub fn set_cmap(&mut self, cmap: ColorMap) -> bool {
        if cmap == self.cmap {
            return false;
        }
        self.cmap = cmap;
        self.calc_carr();
        self.refresh_cache();
        true
    }

    /// Current color map.
    pub fn get_cmap(&self) -> &ColorMap {
        &self.cmap
    }

    /// Replaces the intensity map.
    pub fn set_imap(&mut self, imap: IntensityMap) -> bool {
        if imap == self.imap {
            return false;
        }
        self.imap = imap;
        self.calc_iarr();
        self.refresh_cache();
        true
    }

    /// Current intensity map.
    pub fn get_imap(&self) -> &IntensityMap {
        &self.imap
    }

    /// Replaces the distribution curve, keeping the hash size.
    pub fn set_dist(&mut self, kind: DistKind) -> CmapResult<bool> {
        if kind == self.dist.kind() {
            return Ok(false);
        }
        self.dist = ColorDist::new(kind, self.dist.get_hash_size(), self.colorlen())?;
        self.calc_dist_out();
        self.refresh_cache();
        Ok(true)
    }

    /// Current distribution.
    pub fn get_dist(&self) -> &ColorDist {
        &self.dist
    }

    /// Changes the distribution table size.
    ///
    /// Sizes outside `[colorlen, maxhashsize]` are rejected.
    pub fn set_hash_size(&mut self, size: usize) -> CmapResult<bool> {
        if size == self.dist.get_hash_size() {
            return Ok(false);
        }
        self.dist.set_hash_size(size)?;
        self.calc_dist_out();
        self.refresh_cache();
        Ok(true)
    }

    /// Distribution table size.
    pub fn get_hash_size(&self) -> usize {
        self.dist.get_hash_size()
    }

    /// Toggles color map inversion.
    pub fn invert_cmap(&mut self) -> bool {
        self.set_invert(!self.invert)
    }

    /// Sets color map inversion.
    pub fn set_invert(&mut self, invert: bool) -> bool {
        if invert == self.invert {
            return false;
        }
        self.invert = invert;
        self.calc_carr();
        self.refresh_cache();
        true
    }

    /// Rotates the color map cyclically by `pct` of its length.
    pub fn rotate_cmap(&mut self, pct: f64) -> bool {
        if pct == self.rotate_pct {
            return false;
        }
        self.rotate_pct = pct;
        self.calc_carr();
        self.refresh_cache();
        true
    }

    /// Clears inversion and rotation.
    pub fn reset_cmap(&mut self) -> bool {
        let changed = self.invert || self.rotate_pct != 0.0;
        if changed {
            self.invert = false;
            self.rotate_pct = 0.0;
            self.calc_carr();
            self.refresh_cache();
        }
        changed
    }

    /// Sets contrast, clamped to `[0, 1]`.
    pub fn set_contrast(&mut self, pct: f64) -> bool {
        let pct = pct.clamp(0.0, 1.0);
        if pct == self.contrast {
            return false;
        }
        self.contrast = pct;
        self.calc_sarr();
        self.refresh_cache();
        true
    }

    /// Contrast percentage.
    pub fn get_contrast(&self) -> f64 {
        self.contrast
    }

    /// Sets brightness, clamped to `[0, 1]`.
    pub fn set_brightness(&mut self, pct: f64) -> bool {
        let pct = pct.clamp(0.0, 1.0);
        if pct == self.brightness {
            return false;
        }
        self.brightness = pct;
        self.calc_sarr();
        self.refresh_cache();
        true
    }

    /// Brightness percentage.
    pub fn get_brightness(&self) -> f64 {
        self.brightness
    }

    /// Restores neutral contrast and brightness.
    pub fn reset_sarr(&mut self) -> bool {
        let a = self.set_contrast(0.5);
        let b = self.set_brightness(0.5);
        a || b
    }

    /// The shift array.
    pub fn get_sarr(&self) -> &[u32] {
        &self.sarr
    }

    // ---- table rebuilds ------------------------------------------------

    fn recalc_all(&mut self) {
        self.calc_dist_out();
        self.calc_sarr();
        self.calc_iarr();
        self.calc_carr();
        self.refresh_cache();
    }

    fn calc_dist_out(&mut self) {
        let sentinel: Vec<u32> = (0..=self.dist.get_hash_size() as u32).collect();
        self.dist_out = self.dist.hash_array(&sentinel);
    }

    fn calc_sarr(&mut self) {
        self.sarr = shift_array(self.colorlen(), self.contrast, self.brightness, false);
    }

    fn calc_iarr(&mut self) {
        self.iarr = self.imap.index_table(self.colorlen());
    }

    fn calc_carr(&mut self) {
        let n = self.colorlen();
        let mut carr: Vec<[u16; 3]> = self
            .cmap
            .resampled(n, self.maxc as f32)
            .into_iter()
            .map(|c| c.map(|v| v.round() as u16))
            .collect();
        if self.invert {
            carr.reverse();
        }
        let k = (self.rotate_pct * n as f64).round() as i64;
        carr.rotate_right(k.rem_euclid(n as i64) as usize);
        self.carr = carr;
    }

    /// Runs the stored distribution output through shift, imap and cmap.
    fn refresh_cache(&mut self) {
        let (sarr, iarr, carr) = (&self.sarr, &self.iarr, &self.carr);
        self.cache = self
            .dist_out
            .iter()
            .map(|&d| carr[iarr[sarr[d as usize] as usize] as usize])
            .collect();
        trace!(entries = self.cache.len(), "refresh_cache");
    }

    // ---- mapping -------------------------------------------------------

    /// Returns `true` if [`Self::get_rgb_array`] can use the cache.
    pub fn has_fast_path(&self) -> bool {
        !self.dist.is_data_dependent()
    }

    /// The composed lookup table, `hashsize + 1` entries.
    pub fn cache(&self) -> &[[u16; 3]] {
        &self.cache
    }

    /// Maps integer indices to RGB.
    pub fn map_indices(&self, idx: &[u32]) -> Vec<[u16; 3]> {
        if self.has_fast_path() {
            let last = self.cache.len() - 1;
            return map_slice(idx, |i| self.cache[(i as usize).min(last)]);
        }
        let dist = self.dist.hash_array(idx);
        let (sarr, iarr, carr) = (&self.sarr, &self.iarr, &self.carr);
        map_slice(&dist, |d| carr[iarr[sarr[d as usize] as usize] as usize])
    }

    /// Maps a single-band index image to an RGB(A) image in `order`.
    ///
    /// Sample values are truncated to integer indices and clipped to the
    /// hash table. Alpha, if requested, is opaque.
    pub fn get_rgb_array(&self, idx: &PixelBuffer, order: &str) -> CmapResult<PixelBuffer> {
        if idx.channels != 1 {
            return Err(CmapError::InvalidParameter(format!(
                "index image must be single-band, got {} channels",
                idx.channels
            )));
        }
        let order = ChannelOrder::new(order).map_err(|e| CmapError::InvalidOrder(e.to_string()))?;
        let [ri, gi, bi] = order
            .rgb_indices()
            .ok_or_else(|| CmapError::InvalidOrder(format!("{order} lacks R, G or B")))?;
        let ai = order.index_of('A');
        let nc = order.len();

        let top = (self.dist.get_hash_size() - 1) as f32;
        let indices: Vec<u32> = idx
            .data
            .iter()
            .map(|&v| if v.is_nan() { 0 } else { v.clamp(0.0, top) as u32 })
            .collect();
        let rgb = self.map_indices(&indices);

        let maxc = self.maxc as f32;
        let mut out = vec![0.0f32; rgb.len() * nc];
        for (px, c) in out.chunks_exact_mut(nc).zip(&rgb) {
            px[ri] = c[0] as f32;
            px[gi] = c[1] as f32;
            px[bi] = c[2] as f32;
            if let Some(a) = ai {
                px[a] = maxc;
            }
        }
        debug!(
            width = idx.width,
            height = idx.height,
            order = %order,
            fast = self.has_fast_path(),
            "get_rgb_array"
        );
        PixelBuffer::with_order(idx.width, idx.height, BitDepth::from_bpp(self.bpp), order, out)
            .map_err(|e| CmapError::InvalidParameter(e.to_string()))
    }

    /// Color table entry `index` after inversion and rotation, for
    /// colorbars.
    pub fn get_rgb(&self, index: i64) -> CmapResult<[u16; 3]> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.carr.get(i))
            .copied()
            .ok_or(CmapError::IndexOutOfRange { index, len: self.carr.len() })
    }

    /// Fully mapped color of data index `index`.
    pub fn get_rgbval(&self, index: i64) -> CmapResult<[u16; 3]> {
        let len = self.dist.get_hash_size() + 1;
        let i = usize::try_from(index)
            .ok()
            .filter(|&i| i < len)
            .ok_or(CmapError::IndexOutOfRange { index, len })?;
        Ok(self.map_indices(&[i as u32])[0])
    }
}

fn maxc_for(bpp: u32) -> CmapResult<u32> {
    match bpp {
        8 => Ok(255),
        16 => Ok(65535),
        _ => Err(CmapError::InvalidParameter(format!("bpp must be 8 or 16, got {bpp}"))),
    }
}

#[cfg(feature = "parallel")]
fn map_slice<F: Fn(u32) -> [u16; 3] + Sync>(idx: &[u32], f: F) -> Vec<[u16; 3]> {
    idx.par_iter().with_min_len(4096).map(|&i| f(i)).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_slice<F: Fn(u32) -> [u16; 3]>(idx: &[u32], f: F) -> Vec<[u16; 3]> {
    idx.iter().map(|&i| f(i)).collect()
}
