//! The viewer side of the pipeline: geometry it reports and the sink that
//! receives rendered frames.

use crate::{PixelBuffer, Result};
use serde::{Deserialize, Serialize};

/// View transform and window state reported by a viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerGeometry {
    /// Data coordinate at the window center.
    pub pan: (f64, f64),
    /// Zoom factors.
    pub scale: (f64, f64),
    /// Rotation in degrees, counter-clockwise.
    pub rotation_deg: f64,
    /// Mirror horizontally.
    pub flip_x: bool,
    /// Mirror vertically.
    pub flip_y: bool,
    /// Exchange axes.
    pub swap_xy: bool,
    /// Background color, `[0, 1]` per component.
    pub background: [f32; 3],
    /// Window size in pixels.
    pub window_size: (usize, usize),
}

impl Default for ViewerGeometry {
    fn default() -> Self {
        Self {
            pan: (0.0, 0.0),
            scale: (1.0, 1.0),
            rotation_deg: 0.0,
            flip_x: false,
            flip_y: false,
            swap_xy: false,
            background: [0.0, 0.0, 0.0],
            window_size: (0, 0),
        }
    }
}

/// A consumer of rendered RGB(A) frames.
pub trait RenderTarget {
    /// Current view geometry.
    fn viewer_geometry(&self) -> ViewerGeometry;

    /// Channel order the target wants, for example `"RGBA"`.
    fn rgb_order(&self) -> &str;

    /// Receives a finished frame.
    fn accept(&mut self, frame: &PixelBuffer) -> Result<()>;
}
