//! Color transforms between ICC profiles.

use crate::{IccError, IccResult, Intent, Profile};
use lcms2::{Flags, PixelFormat, Transform as LcmsTransform};
use sky_core::PixelBuffer;
use tracing::trace;

/// Optional soft-proofing step.
#[derive(Debug, Clone, Copy)]
pub struct Proofing<'a> {
    /// Device being simulated.
    pub profile: &'a Profile,
    /// Intent from the working space into the proofed device.
    pub intent: Intent,
}

/// A float RGB transform between two profiles, optionally soft-proofed
/// through a third.
///
/// # Example
///
/// ```rust
/// use sky_icc::{Intent, Profile, StandardProfile, Transform};
///
/// let linear = StandardProfile::LinearSrgb.to_profile().unwrap();
/// let t = Transform::new(&Profile::srgb(), &linear, Intent::Perceptual).unwrap();
/// let mut px = [[0.5f32, 0.5, 0.5]];
/// t.apply(&mut px);
/// assert!(px[0][0] < 0.5);
/// ```
pub struct Transform {
    inner: LcmsTransform<[f32; 3], [f32; 3]>,
}

impl Transform {
    /// Plain transform.
    pub fn new(source: &Profile, dest: &Profile, intent: Intent) -> IccResult<Self> {
        Self::with_options(source, dest, intent, None, false)
    }

    /// Transform with optional soft-proofing and black-point compensation.
    pub fn with_options(
        source: &Profile,
        dest: &Profile,
        intent: Intent,
        proof: Option<Proofing<'_>>,
        black_point: bool,
    ) -> IccResult<Self> {
        trace!(?intent, proof = proof.is_some(), black_point, "icc transform");
        let inner = match proof {
            Some(p) => {
                let mut flags = Flags::SOFT_PROOFING;
                if black_point {
                    flags = flags | Flags::BLACKPOINT_COMPENSATION;
                }
                LcmsTransform::new_proofing(
                    &source.inner,
                    PixelFormat::RGB_FLT,
                    &dest.inner,
                    PixelFormat::RGB_FLT,
                    &p.profile.inner,
                    intent.into(),
                    p.intent.into(),
                    flags,
                )
            }
            None if black_point => LcmsTransform::new_flags(
                &source.inner,
                PixelFormat::RGB_FLT,
                &dest.inner,
                PixelFormat::RGB_FLT,
                intent.into(),
                Flags::BLACKPOINT_COMPENSATION,
            ),
            None => LcmsTransform::new(
                &source.inner,
                PixelFormat::RGB_FLT,
                &dest.inner,
                PixelFormat::RGB_FLT,
                intent.into(),
            ),
        }
        .map_err(|e| IccError::TransformFailed(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Transforms normalized RGB triples in place.
    pub fn apply(&self, pixels: &mut [[f32; 3]]) {
        self.inner.transform_in_place(pixels);
    }

    /// Transforms the color channels of a buffer in place.
    ///
    /// Integer depths are normalized to `[0, 1]` for the transform and
    /// scaled back with rounding and clipping; alpha is left untouched.
    pub fn apply_to(&self, buf: &mut PixelBuffer) -> IccResult<()> {
        let [r, g, b] = buf
            .order
            .rgb_indices()
            .ok_or_else(|| IccError::Unsupported(format!("channel order {}", buf.order)))?;
        let nc = buf.channels;
        let scale = if buf.depth.is_integer() { buf.depth.max_value() } else { 1.0 };

        let mut rgb: Vec<[f32; 3]> = buf
            .data
            .chunks_exact(nc)
            .map(|px| [px[r] / scale, px[g] / scale, px[b] / scale])
            .collect();
        self.apply(&mut rgb);

        let depth = buf.depth;
        for (px, c) in buf.data.chunks_exact_mut(nc).zip(&rgb) {
            px[r] = depth.clip(c[0] * scale);
            px[g] = depth.clip(c[1] * scale);
            px[b] = depth.clip(c[2] * scale);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StandardProfile;
    use sky_core::{BitDepth, ChannelOrder};

    #[test]
    fn test_identity() {
        let srgb = Profile::srgb();
        let t = Transform::new(&srgb, &srgb, Intent::Perceptual).unwrap();
        let original = [0.5f32, 0.3, 0.2];
        let mut pixels = [original];
        t.apply(&mut pixels);
        for c in 0..3 {
            assert!((pixels[0][c] - original[c]).abs() < 0.01);
        }
    }

    #[test]
    fn test_proofing_builds() {
        let srgb = Profile::srgb();
        let adobe = StandardProfile::AdobeRgb.to_profile().unwrap();
        let proof = Proofing { profile: &adobe, intent: Intent::RelativeColorimetric };
        let t = Transform::with_options(&srgb, &srgb, Intent::Perceptual, Some(proof), true).unwrap();
        let mut px = [[0.2f32, 0.6, 0.4]];
        t.apply(&mut px);
        assert!(px[0].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_apply_to_u8_bgra() {
        let srgb = Profile::srgb();
        let linear = StandardProfile::LinearSrgb.to_profile().unwrap();
        let t = Transform::new(&srgb, &linear, Intent::Perceptual).unwrap();
        let order = ChannelOrder::new("BGRA").unwrap();
        let mut buf =
            PixelBuffer::with_order(1, 1, BitDepth::U8, order, vec![128.0, 128.0, 128.0, 200.0]).unwrap();
        t.apply_to(&mut buf).unwrap();
        assert!(buf.data[0] < 128.0);
        assert_eq!(buf.data[0], buf.data[0].round());
        assert_eq!(buf.data[3], 200.0);
    }

    #[test]
    fn test_apply_to_mono_rejected() {
        let srgb = Profile::srgb();
        let t = Transform::new(&srgb, &srgb, Intent::Perceptual).unwrap();
        let mut buf = PixelBuffer::mono(1, 1, vec![1.0]).unwrap();
        assert!(matches!(t.apply_to(&mut buf), Err(IccError::Unsupported(_))));
    }
}
