// src/engine/scale.rs
//
// Scale planning: resolve the requested size against the source, and in fast
// mode pick one of the codec's fixed DCT scaling ratios.

use crate::error::{PipelineError, Result};
use crate::ops::{ScaleMode, ScaleRequest};

/// A codec-native scaling ratio `num / denom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScalingRatio {
    pub num: u32,
    pub denom: u32,
}

impl ScalingRatio {
    pub const fn new(num: u32, denom: u32) -> Self {
        Self { num, denom }
    }

    pub fn is_identity(&self) -> bool {
        self.num == self.denom
    }

    /// Scaled size of one dimension, rounded up like libjpeg-turbo's `TJSCALED`.
    pub fn scale(&self, dim: u32) -> u32 {
        (dim as u64 * self.num as u64).div_ceil(self.denom as u64) as u32
    }
}

/// libjpeg-turbo's IDCT scaling factors, ascending by output size.
pub const LIBJPEG_TURBO_RATIOS: [ScalingRatio; 16] = [
    ScalingRatio::new(1, 8),
    ScalingRatio::new(1, 4),
    ScalingRatio::new(3, 8),
    ScalingRatio::new(1, 2),
    ScalingRatio::new(5, 8),
    ScalingRatio::new(3, 4),
    ScalingRatio::new(7, 8),
    ScalingRatio::new(1, 1),
    ScalingRatio::new(9, 8),
    ScalingRatio::new(5, 4),
    ScalingRatio::new(11, 8),
    ScalingRatio::new(3, 2),
    ScalingRatio::new(13, 8),
    ScalingRatio::new(7, 4),
    ScalingRatio::new(15, 8),
    ScalingRatio::new(2, 1),
];

/// Resolved output size. `ratio` is set only for fast mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalePlan {
    pub width: u32,
    pub height: u32,
    pub mode: ScaleMode,
    pub ratio: Option<ScalingRatio>,
}

impl ScalePlan {
    fn unchanged(width: u32, height: u32, mode: ScaleMode) -> Self {
        Self {
            width,
            height,
            mode,
            ratio: None,
        }
    }

    pub fn is_noop(&self, src_width: u32, src_height: u32) -> bool {
        match self.ratio {
            Some(ratio) => ratio.is_identity(),
            None => self.width == src_width && self.height == src_height,
        }
    }
}

/// Negative targets shrink the source by that many pixels.
fn resolve_target(axis: &'static str, value: i32, src: u32) -> Result<u32> {
    if value >= 0 {
        return Ok(value as u32);
    }
    let resolved = src as i64 + value as i64;
    if resolved <= 0 {
        return Err(PipelineError::scale_too_small(axis, value as i64, 1));
    }
    Ok(resolved as u32)
}

/// `src_other * given / src_given`, truncated, never below 1.
fn proportional(src_other: u32, given: u32, src_given: u32) -> u32 {
    ((src_other as u64 * given as u64) / src_given as u64).max(1) as u32
}

/// Plan a scale of a `src_width` x `src_height` image.
///
/// `ratios` is the codec's table, ascending by output size; it is only
/// consulted in fast mode.
pub fn plan(
    request: &ScaleRequest,
    src_width: u32,
    src_height: u32,
    ratios: &[ScalingRatio],
) -> Result<ScalePlan> {
    let width = resolve_target("width", request.width, src_width)?;
    let height = resolve_target("height", request.height, src_height)?;

    if (width == 0 && height == 0) || (width == src_width && height == src_height) {
        return Ok(ScalePlan::unchanged(src_width, src_height, request.mode));
    }

    if request.mode == ScaleMode::Fast {
        return plan_fast(width, height, src_width, src_height, ratios);
    }

    let (out_w, out_h) = match (width, height) {
        (w, 0) => (w, proportional(src_height, w, src_width)),
        (0, h) => (proportional(src_width, h, src_height), h),
        (w, h) if request.keep_aspect => {
            let from_width = proportional(src_height, w, src_width);
            if from_width <= h {
                (w, from_width)
            } else {
                (proportional(src_width, h, src_height), h)
            }
        }
        (w, h) => (w, h),
    };

    Ok(ScalePlan {
        width: out_w,
        height: out_h,
        mode: request.mode,
        ratio: None,
    })
}

fn plan_fast(
    width: u32,
    height: u32,
    src_width: u32,
    src_height: u32,
    ratios: &[ScalingRatio],
) -> Result<ScalePlan> {
    let smallest = ratios.first().ok_or_else(|| {
        PipelineError::invalid_argument("scale.mode", "SCALE_FAST", "Codec offers no scaling ratios")
    })?;
    let min_w = smallest.scale(src_width);
    let min_h = smallest.scale(src_height);
    if width != 0 && width < min_w {
        return Err(PipelineError::scale_too_small("width", width as i64, min_w));
    }
    if height != 0 && height < min_h {
        return Err(PipelineError::scale_too_small("height", height as i64, min_h));
    }

    let fits = |ratio: &&ScalingRatio| {
        (width == 0 || ratio.scale(src_width) <= width)
            && (height == 0 || ratio.scale(src_height) <= height)
    };
    // largest output that still fits both bounds
    let ratio = *ratios.iter().rev().find(fits).unwrap_or(smallest);

    Ok(ScalePlan {
        width: ratio.scale(src_width),
        height: ratio.scale(src_height),
        mode: ScaleMode::Fast,
        ratio: Some(ratio),
    })
}
