// src/ops.rs
//
// Pipeline requests and host options.
// Options are the loosely-typed shape a host hands us; requests are what the planners consume.
// Nothing here touches pixels.

use crate::engine::{PixelFormat, Subsampling};
use crate::error::{PipelineError, Result};

/// How a scale is carried out.
///
/// `Fast` lets the codec scale during decode by one of its fixed ratios;
/// the others resample decoded pixels to exact dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ScaleMode {
    Fast = 0,
    Nearest = 1,
    Bilinear = 2,
    Bicubic = 3,
}

impl ScaleMode {
    pub const ALL: [ScaleMode; 4] = [
        ScaleMode::Fast,
        ScaleMode::Nearest,
        ScaleMode::Bilinear,
        ScaleMode::Bicubic,
    ];

    pub fn from_code(code: i64) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.code() as i64 == code)
            .ok_or_else(|| {
                PipelineError::invalid_argument(
                    "scale.mode",
                    code.to_string(),
                    "Expected SCALE_FAST, SCALE_NEAREST, SCALE_BILINEAR or SCALE_BICUBIC",
                )
            })
    }

    pub const fn code(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            ScaleMode::Fast => "SCALE_FAST",
            ScaleMode::Nearest => "SCALE_NEAREST",
            ScaleMode::Bilinear => "SCALE_BILINEAR",
            ScaleMode::Bicubic => "SCALE_BICUBIC",
        }
    }
}

/// Crop rectangle as asked for.
///
/// `width`/`height`: zero runs to the far edge, negative stops that many
/// pixels short of it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CropRequest {
    pub x: u32,
    pub y: u32,
    pub width: i32,
    pub height: i32,
    pub precise: bool,
}

impl CropRequest {
    pub fn is_requested(&self) -> bool {
        self.x != 0 || self.y != 0 || self.width != 0 || self.height != 0
    }
}

/// Target size as asked for. Zero derives from the aspect ratio, negative
/// shrinks the source by that many pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaleRequest {
    pub width: i32,
    pub height: i32,
    pub mode: ScaleMode,
    pub keep_aspect: bool,
}

impl ScaleRequest {
    pub fn is_requested(&self) -> bool {
        self.width != 0 || self.height != 0
    }
}

/// Validated decode job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeRequest {
    pub format: PixelFormat,
    pub crop: Option<CropRequest>,
    pub scale: Option<ScaleRequest>,
}

impl DecodeRequest {
    pub fn new(format: PixelFormat) -> Self {
        Self {
            format,
            crop: None,
            scale: None,
        }
    }

    pub fn with_crop(mut self, crop: CropRequest) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn with_scale(mut self, scale: ScaleRequest) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// Validated encode job. `pitch` is the row length in pixels (>= width).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeRequest {
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub format: PixelFormat,
    pub quality: u8,
    pub subsampling: Subsampling,
}

/// Values used when an option is left out.
///
/// Passed into every call; there is no process-wide default state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Defaults {
    pub quality: u8,
    pub subsampling: Subsampling,
    pub format: PixelFormat,
    pub scale_mode: ScaleMode,
    pub keep_aspect: bool,
}

impl Defaults {
    /// The values `Default` hands out; also exported to hosts as `DEFAULT_*`.
    pub const STANDARD: Defaults = Defaults {
        quality: 80,
        subsampling: Subsampling::S420,
        format: PixelFormat::Rgba,
        scale_mode: ScaleMode::Fast,
        keep_aspect: true,
    };
}

impl Default for Defaults {
    fn default() -> Self {
        Self::STANDARD
    }
}

// =============================================================================
// HOST OPTIONS - the shape JavaScript (or any host) passes in
// =============================================================================

/// `crop: { x, y, width, height, precise }`
#[cfg_attr(feature = "napi", napi(object))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CropOptions {
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub precise: Option<bool>,
}

/// `scale: { width, height, mode, keepAspect }`
#[cfg_attr(feature = "napi", napi(object))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScaleOptions {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub mode: Option<u32>,
    pub keep_aspect: Option<bool>,
}

/// Options recognised by every operation; each operation reads the fields it needs.
///
/// - `format`: pixel format code of the raw side (decode output, encode/crop/scale input)
/// - `width`/`height`: raw input dimensions; one may be left out and derived from the input length
/// - `quality`, `pitch`, `subsampling`: encode only
#[cfg_attr(feature = "napi", napi(object))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub format: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u32>,
    pub pitch: Option<u32>,
    pub subsampling: Option<u32>,
    pub crop: Option<CropOptions>,
    pub scale: Option<ScaleOptions>,
}

impl Options {
    pub fn pixel_format(&self, defaults: &Defaults) -> Result<PixelFormat> {
        match self.format {
            Some(code) => PixelFormat::from_code(code as i64),
            None => Ok(defaults.format),
        }
    }

    pub fn quality(&self, defaults: &Defaults) -> Result<u8> {
        match self.quality {
            None => Ok(defaults.quality),
            Some(q @ 1..=100) => Ok(q as u8),
            Some(q) => Err(PipelineError::invalid_argument(
                "quality",
                q.to_string(),
                "Quality must be between 1 and 100",
            )),
        }
    }

    pub fn subsampling(&self) -> Result<Option<Subsampling>> {
        self.subsampling
            .map(|code| Subsampling::from_code(code as i64))
            .transpose()
    }
}

impl CropOptions {
    pub fn to_request(&self) -> CropRequest {
        CropRequest {
            x: self.x.unwrap_or(0),
            y: self.y.unwrap_or(0),
            width: self.width.unwrap_or(0),
            height: self.height.unwrap_or(0),
            precise: self.precise.unwrap_or(false),
        }
    }
}

impl ScaleOptions {
    pub fn to_request(&self, defaults: &Defaults) -> Result<ScaleRequest> {
        let mode = match self.mode {
            Some(code) => ScaleMode::from_code(code as i64)?,
            None => defaults.scale_mode,
        };
        Ok(ScaleRequest {
            width: self.width.unwrap_or(0),
            height: self.height.unwrap_or(0),
            mode,
            keep_aspect: self.keep_aspect.unwrap_or(defaults.keep_aspect),
        })
    }
}
