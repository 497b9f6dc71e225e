// src/engine/crop.rs
//
// Crop planning against the codec's block grid, plus the pixel-level trim
// that turns a block-aligned decode into the exact requested rectangle.

use crate::engine::buffer::{Frame, FrameMut};
use crate::error::{PipelineError, Result};
use crate::ops::CropRequest;

/// Axis-aligned rectangle in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn covers(&self, width: u32, height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == width && self.height == height
    }
}

/// A resolved crop: the exact rectangle, and the block-aligned superset the
/// codec can cut losslessly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropPlan {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub mcu_x: u32,
    pub mcu_y: u32,
    pub mcu_width: u32,
    pub mcu_height: u32,
}

impl CropPlan {
    /// Offset of the exact rectangle inside the block-aligned one.
    pub fn residual(&self) -> (u32, u32) {
        (self.x - self.mcu_x, self.y - self.mcu_y)
    }

    pub fn block_rect(&self) -> Rect {
        Rect::new(self.mcu_x, self.mcu_y, self.mcu_width, self.mcu_height)
    }

    /// The exact rectangle in block-rect coordinates.
    pub fn trim_rect(&self) -> Rect {
        let (rx, ry) = self.residual();
        Rect::new(rx, ry, self.width, self.height)
    }
}

struct AxisPlan {
    extent: u32,
    mcu_offset: u32,
    mcu_extent: u32,
}

fn plan_axis(axis: &'static str, offset: u32, extent: i32, size: u32, block: u32) -> Result<AxisPlan> {
    if offset >= size {
        return Err(PipelineError::crop_out_of_bounds(axis, offset, size));
    }
    let block = block.max(1);
    let mcu_offset = offset - offset % block;
    let residual = offset - mcu_offset;
    let remaining = (size - offset) as i64;

    let mut extent = extent as i64;
    if extent < 0 {
        extent += remaining;
    }

    if extent > 0 && extent < remaining {
        let needed = residual + extent as u32;
        let aligned = needed.div_ceil(block) * block;
        Ok(AxisPlan {
            extent: extent as u32,
            mcu_offset,
            mcu_extent: aligned.min(size - mcu_offset),
        })
    } else {
        // zero, over-long, or negative past the near edge: run to the far edge
        let mcu_extent = size - mcu_offset;
        Ok(AxisPlan {
            extent: mcu_extent - residual,
            mcu_offset,
            mcu_extent,
        })
    }
}

/// Resolve `request` against an image and align it to `block_w` x `block_h`.
pub fn plan(
    request: &CropRequest,
    image_width: u32,
    image_height: u32,
    block_w: u32,
    block_h: u32,
) -> Result<CropPlan> {
    let h = plan_axis("x", request.x, request.width, image_width, block_w)?;
    let v = plan_axis("y", request.y, request.height, image_height, block_h)?;
    Ok(CropPlan {
        x: request.x,
        y: request.y,
        width: h.extent,
        height: v.extent,
        mcu_x: h.mcu_offset,
        mcu_y: v.mcu_offset,
        mcu_width: h.mcu_extent,
        mcu_height: v.mcu_extent,
    })
}

/// Resolve `request` pixel-exactly, with no block alignment.
pub fn resolve(request: &CropRequest, image_width: u32, image_height: u32) -> Result<Rect> {
    let plan = plan(request, image_width, image_height, 1, 1)?;
    Ok(Rect::new(plan.x, plan.y, plan.width, plan.height))
}

/// Copy `rect` out of `src` into `dst`, row by row.
/// `dst` must be exactly `rect.width` x `rect.height`.
pub fn trim(src: Frame<'_>, rect: Rect, mut dst: FrameMut<'_>) -> Result<()> {
    if rect.x + rect.width > src.width || rect.y + rect.height > src.height {
        return Err(PipelineError::crop_out_of_bounds(
            "trim",
            rect.x.max(rect.y),
            src.width.min(src.height),
        ));
    }
    if dst.width != rect.width || dst.height != rect.height || dst.bpp != src.bpp {
        return Err(PipelineError::invalid_argument(
            "trim destination",
            format!("{}x{}", dst.width, dst.height),
            format!("Expected {}x{}", rect.width, rect.height),
        ));
    }

    let bpp = src.bpp;
    let start = rect.x as usize * bpp;
    let len = rect.width as usize * bpp;
    for row in 0..rect.height {
        let src_row = src.row(rect.y + row);
        dst.row_mut(row)
            .copy_from_slice(&src_row[start..start + len]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn req(x: u32, y: u32, width: i32, height: i32) -> CropRequest {
        CropRequest {
            x,
            y,
            width,
            height,
            precise: true,
        }
    }

    #[test]
    fn test_plan_aligns_to_block() {
        let plan = plan(&req(5, 5, 50, 50), 100, 100, 2, 2).unwrap();
        assert_eq!((plan.mcu_x, plan.mcu_y), (4, 4));
        assert_eq!((plan.width, plan.height), (50, 50));
        // 1 residual + 50 rounded up to the 2px grid
        assert_eq!((plan.mcu_width, plan.mcu_height), (52, 52));
        assert_eq!(plan.residual(), (1, 1));
        assert!(plan.mcu_x + plan.mcu_width >= plan.x + plan.width);
    }

    #[test]
    fn test_plan_with_mcu_16() {
        let plan = plan(&req(5, 20, 50, 30), 100, 100, 16, 16).unwrap();
        assert_eq!((plan.mcu_x, plan.mcu_y), (0, 16));
        assert_eq!(plan.mcu_width, 64);
        assert_eq!(plan.mcu_height, 48);
    }

    #[test]
    fn test_zero_extent_runs_to_edge() {
        let plan = plan(&req(10, 0, 0, 0), 100, 40, 8, 8).unwrap();
        assert_eq!(plan.mcu_x, 8);
        assert_eq!(plan.mcu_width, 92);
        assert_eq!(plan.width, 90);
        assert_eq!(plan.height, 40);
    }

    #[test]
    fn test_negative_extent_counts_from_far_edge() {
        let plan = plan(&req(10, 10, -20, -5), 100, 100, 1, 1).unwrap();
        assert_eq!(plan.width, 70);
        assert_eq!(plan.height, 85);
    }

    #[test]
    fn test_overlong_extent_clamps() {
        let plan = plan(&req(90, 0, 50, 500), 100, 100, 8, 8).unwrap();
        assert_eq!(plan.width, 10);
        assert_eq!(plan.mcu_x, 88);
        assert_eq!(plan.mcu_width, 12);
        assert_eq!(plan.height, 100);
    }

    #[test]
    fn test_edge_rect_is_not_block_multiple() {
        let plan = plan(&req(0, 0, 99, 0), 100, 100, 16, 16).unwrap();
        assert_eq!(plan.mcu_width, 100);
    }

    #[test]
    fn test_out_of_bounds() {
        let err = plan(&req(100, 0, 0, 0), 100, 100, 1, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CropOutOfBounds);
        let err = plan(&req(0, 250, 0, 0), 100, 100, 1, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CropOutOfBounds);
    }

    #[test]
    fn test_trim_copies_exact_rect() {
        // 4x3 gray image, value = y * 10 + x
        let src: Vec<u8> = (0..3u8).flat_map(|y| (0..4u8).map(move |x| y * 10 + x)).collect();
        let mut out = vec![0u8; 4];
        trim(
            Frame::new(&src, 4, 3, 1).unwrap(),
            Rect::new(1, 1, 2, 2),
            FrameMut::new(&mut out, 2, 2, 1).unwrap(),
        )
        .unwrap();
        assert_eq!(out, vec![11, 12, 21, 22]);
    }

    #[test]
    fn test_trim_rejects_rect_outside_source() {
        let src = vec![0u8; 16];
        let mut out = vec![0u8; 16];
        let err = trim(
            Frame::new(&src, 4, 4, 1).unwrap(),
            Rect::new(3, 0, 2, 2),
            FrameMut::new(&mut out, 2, 2, 1).unwrap(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CropOutOfBounds);
    }
}
