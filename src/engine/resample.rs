// src/engine/resample.rs
//
// Nearest, bilinear and bicubic resampling of packed 8-bit pixels.
// Every channel is treated independently, padding bytes included.
//
// Source coordinates use `scale = (src - 1) / dst`, so destination pixel 0
// maps to source 0 and the last destination pixel stays inside the source.
// Neighbour taps past the image edge are clamped to the edge pixel.

use crate::engine::buffer::{Frame, FrameMut};
use crate::error::{PipelineError, Result};
use crate::ops::ScaleMode;

/// Resample `src` into `dst`, whose dimensions are the target size.
pub fn resample(src: Frame<'_>, mode: ScaleMode, dst: FrameMut<'_>) -> Result<()> {
    if src.bpp != dst.bpp {
        return Err(PipelineError::invalid_argument(
            "bpp",
            dst.bpp.to_string(),
            format!("Source has {} bytes per pixel", src.bpp),
        ));
    }
    if src.width == 0 || src.height == 0 || dst.width == 0 || dst.height == 0 {
        return Err(PipelineError::invalid_argument(
            "scale",
            format!("{}x{} -> {}x{}", src.width, src.height, dst.width, dst.height),
            "Dimensions must be non-zero",
        ));
    }
    match mode {
        ScaleMode::Fast => Err(PipelineError::invalid_argument(
            "scale.mode",
            "SCALE_FAST",
            "Mode only available while decompressing",
        )),
        ScaleMode::Nearest => {
            nearest(src, dst);
            Ok(())
        }
        ScaleMode::Bilinear => {
            bilinear(src, dst);
            Ok(())
        }
        ScaleMode::Bicubic => {
            bicubic(src, dst);
            Ok(())
        }
    }
}

struct Axis {
    scale: f64,
    last: usize,
}

impl Axis {
    fn new(src: u32, dst: u32) -> Self {
        Self {
            scale: (src as f64 - 1.0) / dst as f64,
            last: src as usize - 1,
        }
    }

    /// Integer tap and fractional offset for destination index `i`.
    fn locate(&self, i: u32) -> (usize, f64) {
        let pos = i as f64 * self.scale;
        let base = pos.floor();
        ((base as usize).min(self.last), pos - base)
    }

    fn clamp(&self, idx: isize) -> usize {
        idx.clamp(0, self.last as isize) as usize
    }
}

#[inline]
fn to_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn nearest(src: Frame<'_>, mut dst: FrameMut<'_>) {
    let bpp = src.bpp;
    let xs = Axis::new(src.width, dst.width);
    let ys = Axis::new(src.height, dst.height);

    for y in 0..dst.height {
        let src_row = src.row(ys.locate(y).0 as u32);
        let out = dst.row_mut(y);
        for (x, px) in (0..).zip(out.chunks_exact_mut(bpp)) {
            let sx = xs.locate(x).0 * bpp;
            px.copy_from_slice(&src_row[sx..sx + bpp]);
        }
    }
}

fn bilinear(src: Frame<'_>, mut dst: FrameMut<'_>) {
    let bpp = src.bpp;
    let xs = Axis::new(src.width, dst.width);
    let ys = Axis::new(src.height, dst.height);
    let (width, height) = (dst.width, dst.height);

    for y in 0..height {
        let (sy, dy) = ys.locate(y);
        let top = src.row(sy as u32);
        let bottom = src.row(ys.clamp(sy as isize + 1) as u32);
        let out = dst.row_mut(y);
        for x in 0..width {
            let (sx, dx) = xs.locate(x);
            let l = sx * bpp;
            let r = xs.clamp(sx as isize + 1) * bpp;
            let o = x as usize * bpp;
            for c in 0..bpp {
                let a = top[l + c] as f64;
                let b = top[r + c] as f64;
                let cc = bottom[l + c] as f64;
                let d = bottom[r + c] as f64;
                let v = a * (1.0 - dx) * (1.0 - dy)
                    + b * dx * (1.0 - dy)
                    + cc * (1.0 - dx) * dy
                    + d * dx * dy;
                out[o + c] = to_u8(v);
            }
        }
    }
}

/// Catmull-Rom through p1..p2 at `t` in [0, 1).
#[inline]
fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    p1 + 0.5
        * t
        * (p2 - p0 + t * (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3 + t * (3.0 * (p1 - p2) + p3 - p0)))
}

fn bicubic(src: Frame<'_>, mut dst: FrameMut<'_>) {
    let bpp = src.bpp;
    let xs = Axis::new(src.width, dst.width);
    let ys = Axis::new(src.height, dst.height);
    let (width, height) = (dst.width, dst.height);

    for y in 0..height {
        let (sy, dy) = ys.locate(y);
        let rows: [&[u8]; 4] =
            std::array::from_fn(|k| src.row(ys.clamp(sy as isize + k as isize - 1) as u32));
        let out = dst.row_mut(y);
        for x in 0..width {
            let (sx, dx) = xs.locate(x);
            let taps: [usize; 4] =
                std::array::from_fn(|k| xs.clamp(sx as isize + k as isize - 1) * bpp);
            let o = x as usize * bpp;
            for c in 0..bpp {
                let col: [f64; 4] = std::array::from_fn(|k| {
                    let row = rows[k];
                    catmull_rom(
                        row[taps[0] + c] as f64,
                        row[taps[1] + c] as f64,
                        row[taps[2] + c] as f64,
                        row[taps[3] + c] as f64,
                        dx,
                    )
                });
                out[o + c] = to_u8(catmull_rom(col[0], col[1], col[2], col[3], dy));
            }
        }
    }
}
