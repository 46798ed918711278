//! Overlay compositing stage.

use super::invalid;
use crate::{Blackboard, StageResult};
use serde::{Deserialize, Serialize};
use sky_core::PixelBuffer;
use sky_ops::composite::{Placement, over_at};
use tracing::trace;

/// Alpha-over of the blackboard's overlays onto the input, in list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeParams {
    /// Multiplies every overlay's own opacity.
    pub opacity: f32,
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self { opacity: 1.0 }
    }
}

impl CompositeParams {
    pub(crate) fn validate(&self) -> StageResult<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(invalid(format!("composite opacity {} outside [0, 1]", self.opacity)));
        }
        Ok(())
    }

    pub(crate) fn run(&self, src: &PixelBuffer, bb: &Blackboard) -> StageResult<PixelBuffer> {
        self.validate()?;
        let mut out = src.clone();
        let alpha_max = src.depth.norm();
        for (i, ov) in bb.overlays.iter().enumerate() {
            trace!(overlay = i, x = ov.x, y = ov.y, opacity = ov.opacity, "composite");
            let b = &ov.buffer;
            over_at(
                &mut out.data,
                out.width,
                out.height,
                out.channels,
                &b.data,
                b.width,
                b.height,
                b.channels,
                Placement { x: ov.x, y: ov.y, opacity: ov.opacity * self.opacity, alpha_max },
            )?;
        }
        out.clip_to_depth();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Overlay;
    use sky_core::{BitDepth, ChannelOrder};

    fn canvas() -> PixelBuffer {
        PixelBuffer::filled(4, 4, BitDepth::U8, ChannelOrder::rgb(), 0.0).unwrap()
    }

    #[test]
    fn test_no_overlays_is_identity() {
        let out = CompositeParams::default().run(&canvas(), &Blackboard::default()).unwrap();
        assert_eq!(out, canvas());
    }

    #[test]
    fn test_overlay_clipped_and_blended() {
        let mut bb = Blackboard::default();
        bb.overlays.push(Overlay {
            x: 3,
            y: -1,
            opacity: 0.5,
            buffer: PixelBuffer::filled(2, 2, BitDepth::U8, ChannelOrder::rgb(), 200.0).unwrap(),
        });
        let out = CompositeParams::default().run(&canvas(), &bb).unwrap();
        assert_eq!(out.pixel(3, 0).unwrap(), &[100.0, 100.0, 100.0]);
        assert_eq!(out.pixel(2, 0).unwrap(), &[0.0, 0.0, 0.0]);
        assert_eq!(out.pixel(3, 1).unwrap(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_overlay_alpha_and_stage_opacity() {
        let mut bb = Blackboard::default();
        let order = ChannelOrder::new("MA").unwrap();
        bb.overlays.push(Overlay {
            x: 0,
            y: 0,
            opacity: 1.0,
            buffer: PixelBuffer::with_order(1, 1, BitDepth::U8, order, vec![255.0, 255.0]).unwrap(),
        });
        let p = CompositeParams { opacity: 0.2 };
        let out = p.run(&canvas(), &bb).unwrap();
        assert_eq!(out.pixel(0, 0).unwrap(), &[51.0, 51.0, 51.0]);
    }

    #[test]
    fn test_channel_mismatch_fails() {
        let mut bb = Blackboard::default();
        bb.overlays.push(Overlay {
            x: 0,
            y: 0,
            opacity: 1.0,
            buffer: PixelBuffer::filled(1, 1, BitDepth::U8, ChannelOrder::rgb(), 1.0).unwrap(),
        });
        let mono = PixelBuffer::new(2, 2, 1, BitDepth::U8, vec![0.0; 4]).unwrap();
        assert!(CompositeParams::default().run(&mono, &bb).is_err());
    }
}
