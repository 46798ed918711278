//! ICC color management stage.

use crate::{Blackboard, StageResult};
use serde::{Deserialize, Serialize};
use sky_core::PixelBuffer;
use sky_icc::{IccResult, Intent, ProfileRegistry, Proofing, Transform};
use tracing::{debug, warn};

/// Convert RGB data between named profiles.
///
/// Names are resolved through the pipeline's
/// [`ProfileRegistry`]. When a profile cannot be resolved or the
/// transform cannot be built, the stage passes its input through
/// unchanged and leaves the blackboard's `icc_profile_used` empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IccParams {
    /// Working-space profile of the incoming data.
    pub input_profile: Option<String>,
    /// Display profile.
    pub output_profile: Option<String>,
    /// Device to soft-proof against.
    pub proof_profile: Option<String>,
    /// Intent for the main transform.
    pub intent: Intent,
    /// Intent into the proofed device.
    pub proof_intent: Intent,
    /// Black-point compensation.
    pub black_point: bool,
}

/// A built transform and the parameters it was built from.
#[derive(Debug)]
pub(crate) struct IccCache {
    key: IccParams,
    transform: Transform,
    proof_used: Option<String>,
}

impl IccParams {
    fn build(&self, input: &str, output: &str, profiles: &ProfileRegistry) -> IccResult<IccCache> {
        let src = profiles.get(input)?;
        let dst = profiles.get(output)?;
        let proof = match self.proof_profile.as_deref().map(|n| (n, profiles.get(n))) {
            Some((_, Ok(p))) => Some(p),
            Some((name, Err(e))) => {
                warn!(profile = name, error = %e, "proof profile unavailable, not proofing");
                None
            }
            None => None,
        };
        let proofing = proof.as_ref().map(|p| Proofing { profile: p, intent: self.proof_intent });
        let transform =
            Transform::with_options(&src, &dst, self.intent, proofing, self.black_point)?;
        let proof_used = proof.and(self.proof_profile.clone());
        Ok(IccCache { key: self.clone(), transform, proof_used })
    }

    pub(crate) fn run(
        &self,
        src: &PixelBuffer,
        bb: &mut Blackboard,
        profiles: &ProfileRegistry,
        cache: &mut Option<IccCache>,
    ) -> StageResult<PixelBuffer> {
        bb.icc_profile_used = None;
        bb.proof_profile_used = None;
        let (Some(input), Some(output)) = (&self.input_profile, &self.output_profile) else {
            debug!("no ICC profiles configured, passing through");
            return Ok(src.clone());
        };
        if src.order.rgb_indices().is_none() {
            warn!(order = %src.order, "ICC transform needs RGB data, passing through");
            return Ok(src.clone());
        }

        if cache.as_ref().is_none_or(|c| c.key != *self) {
            match self.build(input, output, profiles) {
                Ok(built) => *cache = Some(built),
                Err(e) => {
                    warn!(
                        input = %input,
                        output = %output,
                        error = %e,
                        "ICC transform unavailable, passing through"
                    );
                    *cache = None;
                    return Ok(src.clone());
                }
            }
        }
        let Some(built) = cache.as_ref() else {
            return Ok(src.clone());
        };

        let mut out = src.clone();
        built.transform.apply_to(&mut out)?;
        bb.icc_profile_used = Some(output.clone());
        bb.proof_profile_used = built.proof_used.clone();
        debug!(input = %input, output = %output, proof = ?built.proof_used, "ICC transform applied");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sky_core::BitDepth;

    fn gray() -> PixelBuffer {
        PixelBuffer::new(1, 1, 3, BitDepth::U8, vec![128.0, 128.0, 128.0]).unwrap()
    }

    fn params(input: &str, output: &str) -> IccParams {
        IccParams {
            input_profile: Some(input.into()),
            output_profile: Some(output.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_unconfigured_passes_through() {
        let mut bb = Blackboard::default();
        let out =
            IccParams::default().run(&gray(), &mut bb, &ProfileRegistry::new(), &mut None).unwrap();
        assert_eq!(out, gray());
        assert_eq!(bb.icc_profile_used, None);
    }

    #[test]
    fn test_transform_records_profiles() {
        let mut bb = Blackboard::default();
        let mut cache = None;
        let reg = ProfileRegistry::new();
        let p = params("srgb", "linear-srgb");
        let out = p.run(&gray(), &mut bb, &reg, &mut cache).unwrap();
        assert!(out.data[0] < 128.0);
        assert_eq!(bb.icc_profile_used.as_deref(), Some("linear-srgb"));
        assert!(cache.is_some());

        // unchanged parameters reuse the transform
        let again = p.run(&gray(), &mut bb, &reg, &mut cache).unwrap();
        assert_eq!(again, out);
    }

    #[test]
    fn test_unknown_profile_passes_through() {
        let mut bb = Blackboard::default();
        bb.icc_profile_used = Some("stale".into());
        let out = params("srgb", "no-such-display")
            .run(&gray(), &mut bb, &ProfileRegistry::new(), &mut None)
            .unwrap();
        assert_eq!(out, gray());
        assert_eq!(bb.icc_profile_used, None);
    }

    #[test]
    fn test_missing_proof_profile_still_converts() {
        let mut bb = Blackboard::default();
        let p = IccParams { proof_profile: Some("press".into()), ..params("srgb", "display-p3") };
        p.run(&gray(), &mut bb, &ProfileRegistry::new(), &mut None).unwrap();
        assert_eq!(bb.icc_profile_used.as_deref(), Some("display-p3"));
        assert_eq!(bb.proof_profile_used, None);

        let p = IccParams { proof_profile: Some("adobe-rgb".into()), ..params("srgb", "srgb") };
        p.run(&gray(), &mut bb, &ProfileRegistry::new(), &mut None).unwrap();
        assert_eq!(bb.proof_profile_used.as_deref(), Some("adobe-rgb"));
    }

    #[test]
    fn test_mono_passes_through() {
        let src = PixelBuffer::mono(1, 1, vec![0.25]).unwrap();
        let mut bb = Blackboard::default();
        let out = params("srgb", "display-p3")
            .run(&src, &mut bb, &ProfileRegistry::new(), &mut None)
            .unwrap();
        assert_eq!(out, src);
    }
}
