//! Stage types.
//!
//! Every stage kind is a variant of [`StageParams`]. The enum is the
//! registry: its serde tag is the `type` name used in pipeline documents,
//! and [`StageParams::run`] dispatches to the per-kind implementation.
//!
//! | type           | effect                                              |
//! |----------------|-----------------------------------------------------|
//! | `input`        | reads the pipeline input slot                       |
//! | `crop`         | normalized crop rectangle, optional aspect          |
//! | `rotate`       | arbitrary angle, clipped or expanded canvas         |
//! | `scale`        | resample by factor or to a long-side length         |
//! | `flipswap`     | mirror and transpose                                |
//! | `channelmixer` | weighted sum to one band                            |
//! | `whitebalance` | per-channel gain from a reference color             |
//! | `sharpen`      | median then Laplacian unsharp mask                  |
//! | `cuts`         | auto cut levels and rescale                         |
//! | `rgbmap`       | color mapping through the RGB mapper                |
//! | `iccprof`      | ICC transform with optional soft-proofing           |
//! | `composite`    | alpha-over of blackboard overlays                   |

mod color;
mod composite;
mod geometry;
mod icc;
mod levels;

pub use color::{ChannelMixerParams, SharpenParams, WhiteBalanceParams};
pub use composite::CompositeParams;
pub use geometry::{CropParams, FlipSwapParams, RotateParams, ScaleParams, ScaleTarget};
pub use icc::IccParams;
pub use levels::CutsParams;

pub(crate) use icc::IccCache;

use crate::{Blackboard, StageError, StageResult};
use serde::{Deserialize, Serialize};
use sky_cmap::{MapperSettings, RgbMapper};
use sky_core::PixelBuffer;
use sky_icc::ProfileRegistry;

/// Parameters of one stage, tagged by stage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StageParams {
    /// Pipeline input.
    Input,
    /// Crop.
    Crop(CropParams),
    /// Rotate.
    Rotate(RotateParams),
    /// Resample.
    Scale(ScaleParams),
    /// Flip and swap axes.
    FlipSwap(FlipSwapParams),
    /// Mix color channels to one band.
    ChannelMixer(ChannelMixerParams),
    /// White balance.
    WhiteBalance(WhiteBalanceParams),
    /// Sharpen.
    Sharpen(SharpenParams),
    /// Cut levels.
    Cuts(CutsParams),
    /// Color mapping.
    RgbMap(MapperSettings),
    /// ICC color management.
    IccProf(IccParams),
    /// Overlay compositing.
    Composite(CompositeParams),
}

impl StageParams {
    /// All stage type names, in the order a viewer usually chains them.
    pub const NAMES: [&'static str; 12] = [
        "input",
        "crop",
        "rotate",
        "scale",
        "flipswap",
        "channelmixer",
        "whitebalance",
        "sharpen",
        "cuts",
        "rgbmap",
        "iccprof",
        "composite",
    ];

    /// Default parameters for a stage type name.
    ///
    /// ```rust
    /// use sky_pipeline::StageParams;
    ///
    /// let p = StageParams::default_for("cuts").unwrap();
    /// assert_eq!(p.kind(), "cuts");
    /// assert!(StageParams::default_for("blur").is_none());
    /// ```
    pub fn default_for(name: &str) -> Option<Self> {
        let params = match name {
            "input" => StageParams::Input,
            "crop" => StageParams::Crop(CropParams::default()),
            "rotate" => StageParams::Rotate(RotateParams::default()),
            "scale" => StageParams::Scale(ScaleParams::default()),
            "flipswap" => StageParams::FlipSwap(FlipSwapParams::default()),
            "channelmixer" => StageParams::ChannelMixer(ChannelMixerParams::default()),
            "whitebalance" => StageParams::WhiteBalance(WhiteBalanceParams::default()),
            "sharpen" => StageParams::Sharpen(SharpenParams::default()),
            "cuts" => StageParams::Cuts(CutsParams::default()),
            "rgbmap" => StageParams::RgbMap(MapperSettings::default()),
            "iccprof" => StageParams::IccProf(IccParams::default()),
            "composite" => StageParams::Composite(CompositeParams::default()),
            _ => return None,
        };
        Some(params)
    }

    /// Stage type name as written in documents.
    pub fn kind(&self) -> &'static str {
        match self {
            StageParams::Input => "input",
            StageParams::Crop(_) => "crop",
            StageParams::Rotate(_) => "rotate",
            StageParams::Scale(_) => "scale",
            StageParams::FlipSwap(_) => "flipswap",
            StageParams::ChannelMixer(_) => "channelmixer",
            StageParams::WhiteBalance(_) => "whitebalance",
            StageParams::Sharpen(_) => "sharpen",
            StageParams::Cuts(_) => "cuts",
            StageParams::RgbMap(_) => "rgbmap",
            StageParams::IccProf(_) => "iccprof",
            StageParams::Composite(_) => "composite",
        }
    }

    /// One-line description of a stage type.
    pub fn describe(name: &str) -> Option<&'static str> {
        let text = match name {
            "input" => "reads the pipeline input slot",
            "crop" => "normalized crop rectangle with optional aspect ratio",
            "rotate" => "rotate by any angle, clipped or expanded canvas",
            "scale" => "resample by factor or to a long-side length",
            "flipswap" => "mirror horizontally/vertically and swap axes",
            "channelmixer" => "weighted sum of color channels to one band",
            "whitebalance" => "per-channel gain from a reference color",
            "sharpen" => "median filter then Laplacian unsharp mask",
            "cuts" => "automatic cut levels and rescale",
            "rgbmap" => "distribution, contrast, intensity and color mapping",
            "iccprof" => "ICC transform with optional soft-proofing",
            "composite" => "alpha-over of overlay images",
            _ => return None,
        };
        Some(text)
    }

    /// Checks parameter ranges without touching pixel data.
    pub fn validate(&self) -> StageResult<()> {
        match self {
            StageParams::Input | StageParams::FlipSwap(_) => Ok(()),
            StageParams::Crop(p) => p.validate(),
            StageParams::Rotate(p) => p.validate(),
            StageParams::Scale(p) => p.validate(),
            StageParams::ChannelMixer(p) => p.validate(),
            StageParams::WhiteBalance(p) => p.validate(),
            StageParams::Sharpen(p) => p.validate(),
            StageParams::Cuts(p) => p.validate(),
            StageParams::RgbMap(s) => {
                if s.bpp != 8 && s.bpp != 16 {
                    return Err(StageError::InvalidParams(format!("bpp {} (8 or 16)", s.bpp)));
                }
                Ok(())
            }
            StageParams::IccProf(_) => Ok(()),
            StageParams::Composite(p) => p.validate(),
        }
    }

    /// Runs the stage on `prev`.
    ///
    /// Cut levels computed in auto mode are written back into `self`.
    pub(crate) fn run(
        &mut self,
        prev: Option<&PixelBuffer>,
        ctx: &mut StageContext<'_>,
        cache: &mut StageCache,
    ) -> StageResult<PixelBuffer> {
        let src = || prev.ok_or(StageError::NoInput);
        match self {
            StageParams::Input => {
                if ctx.index > 0 {
                    return Err(StageError::MisplacedInput(ctx.index));
                }
                ctx.input.cloned().ok_or(StageError::NoInput)
            }
            StageParams::Crop(p) => p.run(src()?, ctx.blackboard),
            StageParams::Rotate(p) => p.run(src()?),
            StageParams::Scale(p) => p.run(src()?),
            StageParams::FlipSwap(p) => p.run(src()?),
            StageParams::ChannelMixer(p) => p.run(src()?),
            StageParams::WhiteBalance(p) => p.run(src()?),
            StageParams::Sharpen(p) => p.run(src()?),
            StageParams::Cuts(p) => p.run(src()?, ctx.blackboard),
            StageParams::RgbMap(s) => {
                levels::run_rgbmap(s, src()?, ctx.blackboard, &mut cache.mapper)
            }
            StageParams::IccProf(p) => p.run(src()?, ctx.blackboard, ctx.profiles, &mut cache.icc),
            StageParams::Composite(p) => p.run(src()?, ctx.blackboard),
        }
    }
}

/// What a stage sees besides its input buffer.
pub(crate) struct StageContext<'a> {
    /// Position in the pipeline.
    pub index: usize,
    /// The pipeline's input slot.
    pub input: Option<&'a PixelBuffer>,
    pub blackboard: &'a mut Blackboard,
    pub profiles: &'a ProfileRegistry,
}

/// Runtime state kept between runs, never serialized.
#[derive(Debug, Default)]
pub(crate) struct StageCache {
    pub mapper: Option<RgbMapper>,
    pub icc: Option<IccCache>,
}

pub(crate) fn invalid(msg: impl Into<String>) -> StageError {
    StageError::InvalidParams(msg.into())
}
