//! The image provider seen by cut-level algorithms and the pipeline.

use crate::{Error, PixelBuffer, Result};

/// A rectangular cutout and the region it was taken from.
///
/// Coordinates are pixel indices; `x2`/`y2` are exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Cutout {
    /// Cut pixels.
    pub data: PixelBuffer,
    /// Left edge.
    pub x1: usize,
    /// Top edge.
    pub y1: usize,
    /// Right edge (exclusive).
    pub x2: usize,
    /// Bottom edge (exclusive).
    pub y2: usize,
}

/// Read-only access to image pixels.
///
/// Hosts implement [`get_data`](Self::get_data); the remaining methods
/// have default implementations in terms of it.
pub trait ImageSource {
    /// Full-resolution pixels.
    fn get_data(&self) -> &PixelBuffer;

    /// `(width, height)`.
    fn get_size(&self) -> (usize, usize) {
        self.get_data().size()
    }

    /// Finite minimum and maximum, `(0, 0)` if the image has none.
    fn get_minmax(&self) -> (f64, f64) {
        match self.get_data().finite_minmax() {
            Some((lo, hi)) => (lo as f64, hi as f64),
            None => (0.0, 0.0),
        }
    }

    /// Square cutout of half-size `radius` centered on `(cx, cy)`, clipped
    /// to the image.
    fn cutout_radius(&self, cx: usize, cy: usize, radius: usize) -> Result<Cutout> {
        let (w, h) = self.get_size();
        let x1 = cx.saturating_sub(radius);
        let y1 = cy.saturating_sub(radius);
        let x2 = (cx + radius + 1).min(w);
        let y2 = (cy + radius + 1).min(h);
        let data = self.cutout_data(x1, y1, x2, y2, 1, 1)?;
        Ok(Cutout { data, x1, y1, x2, y2 })
    }

    /// Pixels in `[x1, x2) x [y1, y2)`, taking every `xstep`-th column and
    /// `ystep`-th row. The region is clipped to the image.
    fn cutout_data(
        &self,
        x1: usize,
        y1: usize,
        x2: usize,
        y2: usize,
        xstep: usize,
        ystep: usize,
    ) -> Result<PixelBuffer> {
        let src = self.get_data();
        let x2c = x2.min(src.width);
        let y2c = y2.min(src.height);
        if xstep == 0 || ystep == 0 {
            return Err(Error::InvalidRegion {
                x1,
                y1,
                x2,
                y2,
                reason: "step must be positive".into(),
            });
        }
        if x1 >= x2c || y1 >= y2c {
            return Err(Error::InvalidRegion {
                x1,
                y1,
                x2,
                y2,
                reason: "empty after clipping to image".into(),
            });
        }
        let c = src.channels;
        let cols: Vec<usize> = (x1..x2c).step_by(xstep).collect();
        let rows: Vec<usize> = (y1..y2c).step_by(ystep).collect();
        let mut data = Vec::with_capacity(cols.len() * rows.len() * c);
        for &y in &rows {
            let row = &src.data[y * src.width * c..(y + 1) * src.width * c];
            for &x in &cols {
                data.extend_from_slice(&row[x * c..(x + 1) * c]);
            }
        }
        PixelBuffer::with_order(cols.len(), rows.len(), src.depth, src.order.clone(), data)
    }
}

impl ImageSource for PixelBuffer {
    fn get_data(&self) -> &PixelBuffer {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(w: usize, h: usize) -> PixelBuffer {
        PixelBuffer::mono(w, h, (0..w * h).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn test_cutout_data_step() {
        let img = ramp(4, 4);
        let cut = img.cutout_data(0, 0, 4, 4, 2, 2).unwrap();
        assert_eq!(cut.size(), (2, 2));
        assert_eq!(cut.data, vec![0.0, 2.0, 8.0, 10.0]);
    }

    #[test]
    fn test_cutout_radius_clipped() {
        let img = ramp(10, 10);
        let cut = img.cutout_radius(1, 1, 3).unwrap();
        assert_eq!((cut.x1, cut.y1, cut.x2, cut.y2), (0, 0, 5, 5));
        assert_eq!(cut.data.size(), (5, 5));
    }

    #[test]
    fn test_cutout_empty_region() {
        let img = ramp(4, 4);
        assert!(img.cutout_data(5, 0, 8, 4, 1, 1).is_err());
        assert!(img.cutout_data(0, 0, 4, 4, 0, 1).is_err());
    }

    #[test]
    fn test_minmax() {
        let img = ramp(3, 3);
        assert_eq!(img.get_minmax(), (0.0, 8.0));
    }
}
