// src/engine/pipeline.rs
//
// Decode orchestration: probe -> plan crop/scale -> lossless crop -> decode
// (natively scaled when possible) -> precise trim -> precise resample.
//
// Everything is planned before the first pixel buffer exists. Stages that
// are not the last write into at most two scratch rasters; the last stage
// writes straight into the caller's buffer (or one allocated for them).

use crate::codecs::{JpegCodec, JpegHeader};
use crate::engine::buffer::{self, Frame, FrameMut, Raster, Storage};
use crate::engine::crop::{self, CropPlan, Rect};
use crate::engine::decoder;
use crate::engine::resample;
use crate::engine::scale::{self, ScalePlan, ScalingRatio};
use crate::engine::{PixelFormat, Subsampling};
use crate::error::{PipelineError, Result};
use crate::ops::{DecodeRequest, ScaleMode};
use bitflags::bitflags;
use tracing::debug;

bitflags! {
    /// Stages a decode runs besides the header probe and the decode itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Stages: u8 {
        /// Cut the MCU-aligned rectangle out of the compressed stream.
        const LOSSLESS_CROP = 1;
        /// Let the codec scale by a DCT ratio while decoding.
        const NATIVE_SCALE = 1 << 1;
        /// Copy the exact crop out of the decoded block rectangle.
        const PRECISE_TRIM = 1 << 2;
        /// Resample decoded pixels to the exact target size.
        const PRECISE_RESAMPLE = 1 << 3;
    }
}

/// The full decode, resolved before any buffer is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodePlan {
    pub header: JpegHeader,
    pub stages: Stages,
    pub crop: Option<CropPlan>,
    pub scale: Option<ScalePlan>,
    /// Region of the source handed to the lossless crop.
    pub block_rect: Rect,
    /// Size the codec decodes to.
    pub decode_width: u32,
    pub decode_height: u32,
    /// Part of the decoded frame the precise trim keeps.
    pub trim: Rect,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl DecodePlan {
    pub fn output_len(&self) -> Result<usize> {
        buffer::required_buffer_size(self.width, self.height, self.format)
    }
}

/// Map a rectangle into the coordinate space of a natively scaled decode.
fn scale_rect(rect: Rect, ratio: ScalingRatio, frame_w: u32, frame_h: u32) -> Rect {
    let x = ratio.scale(rect.x).min(frame_w.saturating_sub(1));
    let y = ratio.scale(rect.y).min(frame_h.saturating_sub(1));
    Rect::new(
        x,
        y,
        ratio.scale(rect.width).clamp(1, frame_w - x),
        ratio.scale(rect.height).clamp(1, frame_h - y),
    )
}

/// Resolve `request` against a probed header.
pub fn plan_decode(
    header: JpegHeader,
    request: &DecodeRequest,
    ratios: &[ScalingRatio],
) -> Result<DecodePlan> {
    let mut stages = Stages::empty();
    let full = Rect::new(0, 0, header.width, header.height);

    let crop = match request.crop.filter(|c| c.is_requested()) {
        Some(c) => {
            let (block_w, block_h) = header.subsampling.mcu_size();
            Some((crop::plan(&c, header.width, header.height, block_w, block_h)?, c.precise))
        }
        None => None,
    };

    let (block_rect, mut trim) = match crop {
        Some((plan, precise)) => {
            let block = plan.block_rect();
            let trim = if precise {
                plan.trim_rect()
            } else {
                Rect::new(0, 0, block.width, block.height)
            };
            (block, trim)
        }
        None => (full, full),
    };
    if !block_rect.covers(header.width, header.height) {
        stages |= Stages::LOSSLESS_CROP;
    }

    // scale against what the caller would otherwise receive
    let scale = match request.scale.filter(|s| s.is_requested()) {
        Some(s) => Some(scale::plan(&s, trim.width, trim.height, ratios)?)
            .filter(|p| !p.is_noop(trim.width, trim.height)),
        None => None,
    };

    let (mut decode_width, mut decode_height) = (block_rect.width, block_rect.height);
    let (mut width, mut height) = (trim.width, trim.height);
    if let Some(plan) = scale {
        match plan.ratio {
            Some(ratio) => {
                stages |= Stages::NATIVE_SCALE;
                decode_width = ratio.scale(decode_width);
                decode_height = ratio.scale(decode_height);
                trim = scale_rect(trim, ratio, decode_width, decode_height);
                width = trim.width;
                height = trim.height;
            }
            None => {
                stages |= Stages::PRECISE_RESAMPLE;
                width = plan.width;
                height = plan.height;
            }
        }
    }
    if !trim.covers(decode_width, decode_height) {
        stages |= Stages::PRECISE_TRIM;
    }

    Ok(DecodePlan {
        header,
        stages,
        crop: crop.map(|(plan, _)| plan),
        scale,
        block_rect,
        decode_width,
        decode_height,
        trim,
        width,
        height,
        format: request.format,
    })
}

/// A finished decode. `raster` wraps the caller's buffer or a fresh one.
#[derive(Debug)]
pub struct Decompressed<'a> {
    pub raster: Raster<'a>,
    pub subsampling: Subsampling,
}

impl<'a> Decompressed<'a> {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn format(&self) -> PixelFormat {
        self.raster.format()
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.raster.bytes_per_pixel()
    }

    /// Bytes of pixel data written.
    pub fn length(&self) -> usize {
        self.raster.byte_len()
    }

    pub fn pixels(&self) -> &[u8] {
        self.raster.pixels()
    }

    pub fn into_storage(self) -> Storage<'a> {
        self.raster.into_storage()
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Trim(Rect),
    Resample {
        mode: ScaleMode,
        width: u32,
        height: u32,
    },
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Trim(_) => "precise trim",
            Step::Resample { .. } => "precise resample",
        }
    }

    fn output_dims(&self) -> (u32, u32) {
        match *self {
            Step::Trim(rect) => (rect.width, rect.height),
            Step::Resample { width, height, .. } => (width, height),
        }
    }

    fn apply(&self, src: Frame<'_>, dst: FrameMut<'_>) -> Result<()> {
        match *self {
            Step::Trim(rect) => crop::trim(src, rect, dst),
            Step::Resample { mode, .. } => resample::resample(src, mode, dst),
        }
    }
}

/// Scratch rasters for intermediate stages, at most two alive at once.
/// A stage reads the slot its predecessor filled and fills the other one.
#[derive(Default)]
struct StageBuffers {
    slots: [Option<Raster<'static>>; 2],
}

impl StageBuffers {
    fn fill(&mut self, slot: usize, raster: Raster<'static>) -> &mut Raster<'static> {
        self.slots[slot].insert(raster)
    }

    fn get(&self, slot: usize) -> Result<&Raster<'static>> {
        self.slots[slot]
            .as_ref()
            .ok_or_else(|| PipelineError::internal_panic(format!("stage buffer {slot} is empty")))
    }

    /// Source and destination of a stage that moves data between slots.
    fn split(&mut self, src: usize) -> Result<(&Raster<'static>, &mut Raster<'static>)> {
        let [first, second] = &mut self.slots;
        let (src_slot, dst_slot) = if src == 0 { (first, second) } else { (second, first) };
        match (src_slot.as_ref(), dst_slot.as_mut()) {
            (Some(src), Some(dst)) => Ok((src, dst)),
            _ => Err(PipelineError::internal_panic("stage buffers not filled")),
        }
    }

    fn release(&mut self, slot: usize) {
        self.slots[slot] = None;
    }
}

/// Decode `jpeg` according to `request`.
///
/// With `out`, pixels land in the caller's buffer (which must hold the final
/// image; see `DecodePlan::output_len`); without it, a buffer of exactly the
/// output size is allocated. On error nothing is returned and every buffer
/// the pipeline allocated is released.
pub fn decompress<'a, C: JpegCodec + ?Sized>(
    codec: &mut C,
    jpeg: &[u8],
    request: &DecodeRequest,
    out: Option<&'a mut [u8]>,
) -> Result<Decompressed<'a>> {
    let header = decoder::inspect(codec, jpeg)?;
    let plan = plan_decode(header, request, codec.scaling_ratios())?;
    debug!(
        target: "jpeg_pipeline::pipeline",
        src_width = header.width,
        src_height = header.height,
        stages = ?plan.stages,
        width = plan.width,
        height = plan.height,
        "decode planned"
    );

    let storage = buffer::plan(plan.output_len()?, out)?;
    let mut output = Raster::new(storage, plan.width, plan.height, plan.format)?;
    run(codec, jpeg, &plan, &mut output)?;

    Ok(Decompressed {
        raster: output,
        subsampling: header.subsampling,
    })
}

fn run<C: JpegCodec + ?Sized>(
    codec: &mut C,
    jpeg: &[u8],
    plan: &DecodePlan,
    output: &mut Raster<'_>,
) -> Result<()> {
    let cropped;
    let source: &[u8] = if plan.stages.contains(Stages::LOSSLESS_CROP) {
        cropped = codec.lossless_crop(jpeg, plan.block_rect)?;
        &cropped
    } else {
        jpeg
    };

    let steps = [
        plan.stages
            .contains(Stages::PRECISE_TRIM)
            .then_some(Step::Trim(plan.trim)),
        plan.scale
            .filter(|_| plan.stages.contains(Stages::PRECISE_RESAMPLE))
            .map(|s| Step::Resample {
                mode: s.mode,
                width: s.width,
                height: s.height,
            }),
    ];
    let mut pending = steps.iter().flatten().peekable();

    if pending.peek().is_none() {
        debug!(target: "jpeg_pipeline::pipeline", "decode into output");
        codec.decode(
            source,
            plan.decode_width,
            plan.decode_height,
            plan.format,
            output.pixels_mut(),
        )?;
        return Ok(());
    }

    let mut buffers = StageBuffers::default();
    let decoded = buffers.fill(
        0,
        buffer::temporary(plan.decode_width, plan.decode_height, plan.format)?,
    );
    codec.decode(
        source,
        plan.decode_width,
        plan.decode_height,
        plan.format,
        decoded.pixels_mut(),
    )?;

    let mut current = 0;
    while let Some(step) = pending.next() {
        debug!(target: "jpeg_pipeline::pipeline", step = step.name(), slot = current, "stage");
        if pending.peek().is_none() {
            step.apply(buffers.get(current)?.frame(), output.frame_mut())?;
        } else {
            let (w, h) = step.output_dims();
            let next = 1 - current;
            buffers.fill(next, buffer::temporary(w, h, plan.format)?);
            let (src, dst) = buffers.split(current)?;
            step.apply(src.frame(), dst.frame_mut())?;
            buffers.release(current);
            current = next;
        }
    }
    Ok(())
}

#[cfg(any(test, feature = "fuzzing"))]
pub mod fake {
    //! A stand-in codec whose "JPEG" is a tiny header and whose pixels are
    //! a pure function of source coordinates.

    use super::*;
    use crate::codecs::EncodeLayout;
    use crate::engine::scale::LIBJPEG_TURBO_RATIOS;

    pub fn pattern(x: u32, y: u32, c: usize) -> u8 {
        ((x * 3 + y * 5 + c as u32 * 7) % 256) as u8
    }

    pub fn stream(width: u32, height: u32, subsampling: Subsampling) -> Vec<u8> {
        stream_at(width, height, subsampling, 0, 0)
    }

    fn stream_at(width: u32, height: u32, subsampling: Subsampling, ox: u32, oy: u32) -> Vec<u8> {
        let mut bytes = vec![b'F'];
        for v in [width, height, subsampling.code(), ox, oy] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    fn parse(jpeg: &[u8]) -> Result<(JpegHeader, u32, u32)> {
        if jpeg.len() != 21 || jpeg[0] != b'F' {
            return Err(PipelineError::corrupt_input("not a fake stream"));
        }
        let word = |i: usize| {
            let start = 1 + i * 4;
            u32::from_le_bytes([jpeg[start], jpeg[start + 1], jpeg[start + 2], jpeg[start + 3]])
        };
        let header = JpegHeader {
            width: word(0),
            height: word(1),
            subsampling: Subsampling::from_code(word(2) as i64)?,
        };
        Ok((header, word(3), word(4)))
    }

    #[derive(Default)]
    pub struct FakeCodec {
        pub calls: Vec<String>,
        pub fail_decode: bool,
    }

    impl JpegCodec for FakeCodec {
        fn probe_header(&mut self, jpeg: &[u8]) -> Result<JpegHeader> {
            self.calls.push("probe".into());
            parse(jpeg).map(|(h, _, _)| h)
        }

        fn lossless_crop(&mut self, jpeg: &[u8], rect: Rect) -> Result<Vec<u8>> {
            self.calls
                .push(format!("crop {},{} {}x{}", rect.x, rect.y, rect.width, rect.height));
            let (header, ox, oy) = parse(jpeg)?;
            let (bw, bh) = header.subsampling.mcu_size();
            if rect.x % bw != 0 || rect.y % bh != 0 {
                return Err(PipelineError::codec("lossless crop", "unaligned origin"));
            }
            Ok(stream_at(
                rect.width,
                rect.height,
                header.subsampling,
                ox + rect.x,
                oy + rect.y,
            ))
        }

        fn decode(
            &mut self,
            jpeg: &[u8],
            width: u32,
            height: u32,
            format: PixelFormat,
            out: &mut [u8],
        ) -> Result<usize> {
            self.calls.push(format!("decode {width}x{height}"));
            if self.fail_decode {
                return Err(PipelineError::codec("decode", "injected failure"));
            }
            let (header, ox, oy) = parse(jpeg)?;
            if width != header.width || height != header.height {
                let ratio = LIBJPEG_TURBO_RATIOS
                    .iter()
                    .find(|r| r.scale(header.width) == width && r.scale(header.height) == height);
                if ratio.is_none() {
                    return Err(PipelineError::codec("decode", "no ratio"));
                }
            }
            let bpp = format.bytes_per_pixel();
            for y in 0..height {
                for x in 0..width {
                    let sx = ox + x * header.width / width;
                    let sy = oy + y * header.height / height;
                    let o = (y * width + x) as usize * bpp;
                    for c in 0..bpp {
                        out[o + c] = pattern(sx, sy, c);
                    }
                }
            }
            Ok(width as usize * height as usize * bpp)
        }

        fn encode(&mut self, pixels: &[u8], layout: &EncodeLayout, out: &mut [u8]) -> Result<usize> {
            self.calls.push(format!("encode q{}", layout.quality));
            let n = pixels.len().min(out.len()).min(16);
            out[..n].copy_from_slice(&pixels[..n]);
            Ok(n)
        }

        fn scaling_ratios(&self) -> &[ScalingRatio] {
            &LIBJPEG_TURBO_RATIOS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{pattern, stream, FakeCodec};
    use super::*;
    use crate::error::ErrorKind;
    use crate::ops::{CropRequest, ScaleRequest};

    fn crop(x: u32, y: u32, width: i32, height: i32, precise: bool) -> CropRequest {
        CropRequest {
            x,
            y,
            width,
            height,
            precise,
        }
    }

    fn scale(width: i32, height: i32, mode: ScaleMode) -> ScaleRequest {
        ScaleRequest {
            width,
            height,
            mode,
            keep_aspect: true,
        }
    }

    #[test]
    fn test_plain_decode_writes_into_caller_buffer() {
        let jpeg = stream(8, 4, Subsampling::S444);
        let mut codec = FakeCodec::default();
        let mut out = vec![0u8; 200];
        let result = decompress(
            &mut codec,
            &jpeg,
            &DecodeRequest::new(PixelFormat::Rgb),
            Some(&mut out),
        )
        .unwrap();
        assert_eq!((result.width(), result.height()), (8, 4));
        assert_eq!(result.length(), 96);
        assert_eq!(result.subsampling, Subsampling::S444);
        assert!(result.raster.storage().is_borrowed());
        drop(result);
        assert_eq!(codec.calls, vec!["probe", "decode 8x4"]);
        assert_eq!(out[3 * 3 + 1], pattern(3, 0, 1));
    }

    #[test]
    fn test_precise_crop_trims_to_exact_rect() {
        let jpeg = stream(100, 100, Subsampling::S420);
        let request = DecodeRequest::new(PixelFormat::Rgba).with_crop(crop(5, 5, 50, 50, true));
        let mut codec = FakeCodec::default();
        let result = decompress(&mut codec, &jpeg, &request, None).unwrap();

        assert_eq!((result.width(), result.height()), (50, 50));
        assert_eq!(codec.calls[1], "crop 0,0 64x64");
        let px = result.pixels();
        for (x, y) in [(0u32, 0u32), (49, 0), (13, 27), (49, 49)] {
            let o = ((y * 50 + x) * 4) as usize;
            assert_eq!(px[o + 2], pattern(5 + x, 5 + y, 2), "pixel {x},{y}");
        }
    }

    #[test]
    fn test_plan_for_block_aligned_crop() {
        let header = JpegHeader {
            width: 100,
            height: 100,
            subsampling: Subsampling::S420,
        };
        let request = DecodeRequest::new(PixelFormat::Rgb).with_crop(crop(16, 32, 32, 16, true));
        let plan = plan_decode(header, &request, &scale::LIBJPEG_TURBO_RATIOS).unwrap();
        assert_eq!(plan.stages, Stages::LOSSLESS_CROP);
        assert_eq!(plan.block_rect, Rect::new(16, 32, 32, 16));
    }

    #[test]
    fn test_imprecise_crop_returns_block_rect() {
        let jpeg = stream(100, 100, Subsampling::S420);
        let request = DecodeRequest::new(PixelFormat::Gray).with_crop(crop(20, 20, 10, 10, false));
        let mut codec = FakeCodec::default();
        let result = decompress(&mut codec, &jpeg, &request, None).unwrap();
        // origin rounds down to 16, 4 + 10 rounds up to one MCU
        assert_eq!((result.width(), result.height()), (16, 16));
        assert_eq!(result.pixels()[0], pattern(16, 16, 0));
    }

    #[test]
    fn test_nearest_scale_resolves_aspect() {
        let jpeg = stream(256, 128, Subsampling::S420);
        let request =
            DecodeRequest::new(PixelFormat::Rgb).with_scale(scale(64, 0, ScaleMode::Nearest));
        let mut codec = FakeCodec::default();
        let result = decompress(&mut codec, &jpeg, &request, None).unwrap();
        assert_eq!((result.width(), result.height()), (64, 32));
        assert_eq!(codec.calls, vec!["probe", "decode 256x128"]);
    }

    #[test]
    fn test_trim_then_resample_uses_both_slots() {
        let jpeg = stream(200, 100, Subsampling::S422);
        let request = DecodeRequest::new(PixelFormat::Rgba)
            .with_crop(crop(10, 10, 100, 50, true))
            .with_scale(scale(50, 0, ScaleMode::Bilinear));
        let header = JpegHeader {
            width: 200,
            height: 100,
            subsampling: Subsampling::S422,
        };
        let plan = plan_decode(header, &request, &scale::LIBJPEG_TURBO_RATIOS).unwrap();
        assert_eq!(
            plan.stages,
            Stages::LOSSLESS_CROP | Stages::PRECISE_TRIM | Stages::PRECISE_RESAMPLE
        );

        let mut codec = FakeCodec::default();
        let out_len = 50 * 25 * 4;
        let mut out = vec![0u8; out_len];
        let result = decompress(&mut codec, &jpeg, &request, Some(&mut out)).unwrap();
        assert_eq!((result.width(), result.height()), (50, 25));
        assert_eq!(result.length(), out_len);
    }

    #[test]
    fn test_fast_scale_decodes_natively() {
        let jpeg = stream(1024, 768, Subsampling::S420);
        let request =
            DecodeRequest::new(PixelFormat::Rgb).with_scale(scale(300, 0, ScaleMode::Fast));
        let mut codec = FakeCodec::default();
        let result = decompress(&mut codec, &jpeg, &request, None).unwrap();
        assert_eq!((result.width(), result.height()), (256, 192));
        assert_eq!(codec.calls, vec!["probe", "decode 256x192"]);
    }

    #[test]
    fn test_fast_scale_rescales_precise_crop() {
        let header = JpegHeader {
            width: 1024,
            height: 1024,
            subsampling: Subsampling::S420,
        };
        let request = DecodeRequest::new(PixelFormat::Rgb)
            .with_crop(crop(40, 40, 400, 400, true))
            .with_scale(scale(200, 200, ScaleMode::Fast));
        let plan = plan_decode(header, &request, &scale::LIBJPEG_TURBO_RATIOS).unwrap();
        assert!(plan.stages.contains(Stages::NATIVE_SCALE | Stages::PRECISE_TRIM));
        // block rect 32,32 416x416 decoded at 1/2
        assert_eq!((plan.decode_width, plan.decode_height), (208, 208));
        assert_eq!(plan.trim, Rect::new(4, 4, 200, 200));
        assert_eq!((plan.width, plan.height), (200, 200));
    }

    #[test]
    fn test_short_caller_buffer_fails_before_decode() {
        let jpeg = stream(25, 10, Subsampling::S444);
        let mut codec = FakeCodec::default();
        let mut out = [0xAAu8; 10];
        let err = decompress(
            &mut codec,
            &jpeg,
            &DecodeRequest::new(PixelFormat::Rgba),
            Some(&mut out),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
        assert!(out.iter().all(|&b| b == 0xAA));
        assert_eq!(codec.calls, vec!["probe"]);
    }

    #[test]
    fn test_crop_out_of_bounds_fails_before_codec_work() {
        let jpeg = stream(64, 64, Subsampling::S444);
        let mut codec = FakeCodec::default();
        let request = DecodeRequest::new(PixelFormat::Rgb).with_crop(crop(64, 0, 0, 0, false));
        let err = decompress(&mut codec, &jpeg, &request, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CropOutOfBounds);
        assert_eq!(codec.calls, vec!["probe"]);
    }

    #[test]
    fn test_corrupt_input() {
        let mut codec = FakeCodec::default();
        let err = decompress(
            &mut codec,
            b"not a jpeg",
            &DecodeRequest::new(PixelFormat::Rgb),
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptInput);
    }

    #[test]
    fn test_codec_failure_mid_pipeline_returns_only_error() {
        let jpeg = stream(64, 64, Subsampling::S444);
        let mut codec = FakeCodec {
            fail_decode: true,
            ..Default::default()
        };
        let request = DecodeRequest::new(PixelFormat::Rgb)
            .with_crop(crop(3, 3, 10, 10, true))
            .with_scale(scale(5, 5, ScaleMode::Bicubic));
        let err = decompress(&mut codec, &jpeg, &request, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CodecError);
    }

    #[test]
    fn test_noop_scale_adds_no_stage() {
        let header = JpegHeader {
            width: 40,
            height: 30,
            subsampling: Subsampling::S444,
        };
        let request =
            DecodeRequest::new(PixelFormat::Rgb).with_scale(scale(40, 30, ScaleMode::Bicubic));
        let plan = plan_decode(header, &request, &scale::LIBJPEG_TURBO_RATIOS).unwrap();
        assert!(plan.stages.is_empty());
        assert!(plan.scale.is_none());
    }
}
