//! State shared between stages during a run.

use sky_core::{ChannelOrder, PixelBuffer, ViewerGeometry};

/// An image composited over the frame by the `composite` stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    /// Left edge in frame pixels; may be negative.
    pub x: i64,
    /// Top edge in frame pixels; may be negative.
    pub y: i64,
    /// Global opacity, `[0, 1]`.
    pub opacity: f32,
    /// Overlay pixels. A trailing alpha channel is honored.
    pub buffer: PixelBuffer,
}

/// Typed values that stages read and write while the pipeline runs.
///
/// The host fills in viewer-related fields (see
/// [`Pipeline::sync_viewer`](crate::Pipeline::sync_viewer)); stages record
/// what they decided so later stages and the host can inspect it.
#[derive(Debug, Clone, PartialEq)]
pub struct Blackboard {
    /// Channel order of RGB output requested by the viewer.
    pub order: ChannelOrder,
    /// Current view geometry.
    pub viewer: ViewerGeometry,
    /// Pixel offset of the last crop within its input.
    pub crop_offset: (usize, usize),
    /// Cut levels computed by the last auto-cuts run.
    pub cut_levels: Option<(f64, f64)>,
    /// Output profile actually applied by the ICC stage.
    pub icc_profile_used: Option<String>,
    /// Proofing profile actually applied by the ICC stage.
    pub proof_profile_used: Option<String>,
    /// Images for the composite stage.
    pub overlays: Vec<Overlay>,
    /// Duration of the last run in milliseconds.
    pub last_run_ms: f64,
}

impl Default for Blackboard {
    fn default() -> Self {
        Self {
            order: ChannelOrder::rgb(),
            viewer: ViewerGeometry::default(),
            crop_offset: (0, 0),
            cut_levels: None,
            icc_profile_used: None,
            proof_profile_used: None,
            overlays: Vec::new(),
            last_run_ms: 0.0,
        }
    }
}
