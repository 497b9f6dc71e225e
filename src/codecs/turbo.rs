// src/codecs/turbo.rs
//
// libjpeg-turbo backend via the `turbojpeg` crate.
// Handles are created on first use and released when the codec is dropped.

use super::{EncodeLayout, JpegCodec, JpegHeader};
use crate::engine::common::run_with_panic_policy;
use crate::engine::crop::Rect;
use crate::engine::scale::{ScalingRatio, LIBJPEG_TURBO_RATIOS};
use crate::engine::{PixelFormat, Subsampling};
use crate::error::{PipelineError, Result};
use tracing::debug;
use turbojpeg::{Compressor, Decompressor, Transformer};

fn tj_format(format: PixelFormat) -> turbojpeg::PixelFormat {
    match format {
        PixelFormat::Rgb => turbojpeg::PixelFormat::RGB,
        PixelFormat::Bgr => turbojpeg::PixelFormat::BGR,
        PixelFormat::Rgbx => turbojpeg::PixelFormat::RGBX,
        PixelFormat::Bgrx => turbojpeg::PixelFormat::BGRX,
        PixelFormat::Xbgr => turbojpeg::PixelFormat::XBGR,
        PixelFormat::Xrgb => turbojpeg::PixelFormat::XRGB,
        PixelFormat::Gray => turbojpeg::PixelFormat::GRAY,
        PixelFormat::Rgba => turbojpeg::PixelFormat::RGBA,
        PixelFormat::Bgra => turbojpeg::PixelFormat::BGRA,
        PixelFormat::Abgr => turbojpeg::PixelFormat::ABGR,
        PixelFormat::Argb => turbojpeg::PixelFormat::ARGB,
    }
}

fn tj_subsamp(subsampling: Subsampling) -> turbojpeg::Subsamp {
    match subsampling {
        Subsampling::S444 => turbojpeg::Subsamp::None,
        Subsampling::S422 => turbojpeg::Subsamp::Sub2x1,
        Subsampling::S420 => turbojpeg::Subsamp::Sub2x2,
        Subsampling::Gray => turbojpeg::Subsamp::Gray,
        Subsampling::S440 => turbojpeg::Subsamp::Sub1x2,
    }
}

#[allow(unreachable_patterns)]
fn from_tj_subsamp(subsamp: turbojpeg::Subsamp) -> Result<Subsampling> {
    match subsamp {
        turbojpeg::Subsamp::None => Ok(Subsampling::S444),
        turbojpeg::Subsamp::Sub2x1 => Ok(Subsampling::S422),
        turbojpeg::Subsamp::Sub2x2 => Ok(Subsampling::S420),
        turbojpeg::Subsamp::Gray => Ok(Subsampling::Gray),
        turbojpeg::Subsamp::Sub1x2 => Ok(Subsampling::S440),
        other => Err(PipelineError::codec(
            "header",
            format!("unsupported chroma subsampling {other:?}"),
        )),
    }
}

fn dim(name: &'static str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        PipelineError::corrupt_input(format!("{name} {value} does not fit in 32 bits"))
    })
}

fn codec_err(operation: &'static str) -> impl Fn(turbojpeg::Error) -> PipelineError {
    move |e| PipelineError::codec(operation, e.to_string())
}

/// `JpegCodec` backed by libjpeg-turbo.
#[derive(Default)]
pub struct TurboJpegCodec {
    decompressor: Option<Decompressor>,
    compressor: Option<Compressor>,
    transformer: Option<Transformer>,
}

impl TurboJpegCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn decompressor(&mut self) -> Result<&mut Decompressor> {
        let slot = &mut self.decompressor;
        if slot.is_none() {
            *slot = Some(Decompressor::new().map_err(codec_err("decompressor init"))?);
        }
        slot.as_mut()
            .ok_or_else(|| PipelineError::internal_panic("decompressor handle missing"))
    }

    fn compressor(&mut self) -> Result<&mut Compressor> {
        let slot = &mut self.compressor;
        if slot.is_none() {
            *slot = Some(Compressor::new().map_err(codec_err("compressor init"))?);
        }
        slot.as_mut()
            .ok_or_else(|| PipelineError::internal_panic("compressor handle missing"))
    }

    fn transformer(&mut self) -> Result<&mut Transformer> {
        let slot = &mut self.transformer;
        if slot.is_none() {
            *slot = Some(Transformer::new().map_err(codec_err("transformer init"))?);
        }
        slot.as_mut()
            .ok_or_else(|| PipelineError::internal_panic("transformer handle missing"))
    }
}

impl JpegCodec for TurboJpegCodec {
    fn probe_header(&mut self, jpeg: &[u8]) -> Result<JpegHeader> {
        run_with_panic_policy("header:jpeg", || {
            let header = self
                .decompressor()?
                .read_header(jpeg)
                .map_err(|e| PipelineError::corrupt_input(e.to_string()))?;
            Ok(JpegHeader {
                width: dim("width", header.width)?,
                height: dim("height", header.height)?,
                subsampling: from_tj_subsamp(header.subsamp)?,
            })
        })
    }

    fn lossless_crop(&mut self, jpeg: &[u8], rect: Rect) -> Result<Vec<u8>> {
        debug!(
            target: "jpeg_pipeline::codec",
            x = rect.x, y = rect.y, width = rect.width, height = rect.height,
            "lossless crop"
        );
        run_with_panic_policy("crop:jpeg", || {
            let mut transform = turbojpeg::Transform::default();
            transform.crop = Some(turbojpeg::TransformCrop {
                x: rect.x as usize,
                y: rect.y as usize,
                width: Some(rect.width as usize),
                height: Some(rect.height as usize),
            });
            let cropped = self
                .transformer()?
                .transform_to_vec(&transform, jpeg)
                .map_err(codec_err("lossless crop"))?;
            Ok(cropped)
        })
    }

    fn decode(
        &mut self,
        jpeg: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        out: &mut [u8],
    ) -> Result<usize> {
        let bpp = format.bytes_per_pixel();
        let len = width as usize * height as usize * bpp;
        if out.len() < len {
            return Err(PipelineError::buffer_too_small("Decode", len, out.len()));
        }
        run_with_panic_policy("decode:jpeg", || {
            let decompressor = self.decompressor()?;
            let header = decompressor
                .read_header(jpeg)
                .map_err(|e| PipelineError::corrupt_input(e.to_string()))?;
            let (src_w, src_h) = (dim("width", header.width)?, dim("height", header.height)?);
            let ratio = LIBJPEG_TURBO_RATIOS
                .iter()
                .find(|r| r.scale(src_w) == width && r.scale(src_h) == height)
                .ok_or_else(|| {
                    PipelineError::invalid_argument(
                        "decode size",
                        format!("{width}x{height}"),
                        format!("No native scaling ratio maps {src_w}x{src_h} to it"),
                    )
                })?;
            debug!(
                target: "jpeg_pipeline::codec",
                width, height, num = ratio.num, denom = ratio.denom,
                "decode"
            );
            decompressor
                .set_scaling_factor(turbojpeg::ScalingFactor::new(
                    ratio.num as usize,
                    ratio.denom as usize,
                ))
                .map_err(codec_err("decode"))?;
            let image = turbojpeg::Image {
                pixels: &mut out[..len],
                width: width as usize,
                pitch: width as usize * bpp,
                height: height as usize,
                format: tj_format(format),
            };
            decompressor
                .decompress(jpeg, image)
                .map_err(codec_err("decode"))?;
            Ok(len)
        })
    }

    fn encode(&mut self, pixels: &[u8], layout: &EncodeLayout, out: &mut [u8]) -> Result<usize> {
        run_with_panic_policy("encode:jpeg", || {
            let compressor = self.compressor()?;
            compressor
                .set_quality(layout.quality as i32)
                .map_err(codec_err("encode"))?;
            compressor
                .set_subsamp(tj_subsamp(layout.subsampling))
                .map_err(codec_err("encode"))?;
            let image = turbojpeg::Image {
                pixels,
                width: layout.width as usize,
                pitch: layout.row_stride,
                height: layout.height as usize,
                format: tj_format(layout.format),
            };
            let used = compressor
                .compress_to_slice(image, out)
                .map_err(codec_err("encode"))?;
            debug!(target: "jpeg_pipeline::codec", used, capacity = out.len(), "encode");
            Ok(used)
        })
    }

    fn scaling_ratios(&self) -> &[ScalingRatio] {
        &LIBJPEG_TURBO_RATIOS
    }

    fn encoded_buffer_size(&self, width: u32, height: u32, subsampling: Subsampling) -> Result<usize> {
        turbojpeg::compressed_buf_len(width as usize, height as usize, tj_subsamp(subsampling))
            .map_err(codec_err("buffer size"))
    }
}
