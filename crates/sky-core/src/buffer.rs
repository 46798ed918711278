//! Owned interleaved pixel buffer.
//!
//! [`PixelBuffer`] is the unit of data passed between rendering stages.
//! Samples are `f32`, interleaved, row-major, top-to-bottom:
//!
//! ```text
//! Memory: [R G B R G B R G B ...]  <- Row 0
//!         [R G B R G B R G B ...]  <- Row 1
//! ```
//!
//! Monochrome data has one channel and order `"M"`.
//!
//! # Ownership
//!
//! A buffer belongs to whoever produced it. Consumers borrow it and build a
//! new buffer for their output; nothing mutates another stage's result.

use crate::{BitDepth, ChannelOrder, Error, Result, LUMA_WEIGHTS};

/// Interleaved `f32` pixel data with dimensions, depth and channel order.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Interleaved channels per pixel.
    pub channels: usize,
    /// Nominal sample type.
    pub depth: BitDepth,
    /// Channel meaning.
    pub order: ChannelOrder,
    /// Samples, `width * height * channels` long.
    pub data: Vec<f32>,
}

impl PixelBuffer {
    /// Creates a buffer, checking that the sample count matches the shape.
    ///
    /// The channel order defaults to M, MA, RGB or RGBA depending on
    /// `channels`.
    ///
    /// ```rust
    /// use sky_core::{BitDepth, PixelBuffer};
    ///
    /// let buf = PixelBuffer::new(2, 2, 3, BitDepth::U8, vec![0.0; 12]).unwrap();
    /// assert_eq!(buf.order.as_str(), "RGB");
    /// assert!(PixelBuffer::new(2, 2, 3, BitDepth::U8, vec![0.0; 11]).is_err());
    /// ```
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        depth: BitDepth,
        data: Vec<f32>,
    ) -> Result<Self> {
        let order = ChannelOrder::for_channels(channels)?;
        Self::with_order(width, height, depth, order, data)
    }

    /// Creates a buffer with an explicit channel order.
    ///
    /// The channel count is taken from the order.
    pub fn with_order(
        width: usize,
        height: usize,
        depth: BitDepth,
        order: ChannelOrder,
        data: Vec<f32>,
    ) -> Result<Self> {
        let channels = order.len();
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                width,
                height,
                channels,
                reason: "width and height must be positive".into(),
            });
        }
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(Error::BufferSize { expected, got: data.len() });
        }
        Ok(Self { width, height, channels, depth, order, data })
    }

    /// Single-channel float buffer.
    pub fn mono(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        Self::with_order(width, height, BitDepth::F32, ChannelOrder::mono(), data)
    }

    /// Buffer filled with `value`.
    pub fn filled(
        width: usize,
        height: usize,
        depth: BitDepth,
        order: ChannelOrder,
        value: f32,
    ) -> Result<Self> {
        let len = width * height * order.len();
        Self::with_order(width, height, depth, order, vec![value; len])
    }

    /// Returns a buffer with the same shape and order but new samples.
    pub fn like(&self, data: Vec<f32>) -> Result<Self> {
        Self::with_order(self.width, self.height, self.depth, self.order.clone(), data)
    }

    /// `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Returns `true` for single-channel data.
    pub fn is_mono(&self) -> bool {
        self.channels == 1
    }

    /// Samples of the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Result<&[f32]> {
        if x >= self.width || y >= self.height {
            return Err(Error::OutOfBounds { x, y, width: self.width, height: self.height });
        }
        let i = (y * self.width + x) * self.channels;
        Ok(&self.data[i..i + self.channels])
    }

    /// Copies one channel out as a plane.
    pub fn channel(&self, c: usize) -> Result<Vec<f32>> {
        if c >= self.channels {
            return Err(Error::ChannelMismatch { expected: c + 1, got: self.channels });
        }
        Ok(self.data.iter().skip(c).step_by(self.channels).copied().collect())
    }

    /// Minimum and maximum over finite samples, or `None` if there are none.
    pub fn finite_minmax(&self) -> Option<(f32, f32)> {
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for &v in self.data.iter().filter(|v| v.is_finite()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        (lo <= hi).then_some((lo, hi))
    }

    /// Collapses color data to one luminance channel with Rec.601 weights.
    ///
    /// Mono data is returned unchanged (alpha dropped).
    pub fn to_luma(&self) -> Self {
        let data: Vec<f32> = match self.order.rgb_indices() {
            Some([r, g, b]) => self
                .data
                .chunks_exact(self.channels)
                .map(|p| LUMA_WEIGHTS[0] * p[r] + LUMA_WEIGHTS[1] * p[g] + LUMA_WEIGHTS[2] * p[b])
                .collect(),
            None => self.data.iter().step_by(self.channels).copied().collect(),
        };
        Self {
            width: self.width,
            height: self.height,
            channels: 1,
            depth: self.depth,
            order: ChannelOrder::mono(),
            data,
        }
    }

    /// Returns a copy with an alpha channel appended (opaque at `alpha`).
    ///
    /// Buffers that already carry alpha are cloned.
    pub fn with_alpha(&self, alpha: f32) -> Self {
        if self.order.has_alpha() {
            return self.clone();
        }
        let c = self.channels;
        let mut data = Vec::with_capacity(self.pixel_count() * (c + 1));
        for p in self.data.chunks_exact(c) {
            data.extend_from_slice(p);
            data.push(alpha);
        }
        Self {
            width: self.width,
            height: self.height,
            channels: c + 1,
            depth: self.depth,
            order: self.order.with_alpha(),
            data,
        }
    }

    /// Clips every sample to the range of [`Self::depth`].
    pub fn clip_to_depth(&mut self) {
        let depth = self.depth;
        if depth.is_integer() {
            self.data.iter_mut().for_each(|v| *v = depth.clip(*v));
        }
    }
}
