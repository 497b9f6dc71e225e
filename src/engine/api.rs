// src/engine/api.rs
//
// Host-facing operations: decompress, compress, crop, scale, header,
// buffer_size, bytes_per_pixel.
// Each takes the input bytes, an optional destination and the shared
// `Options` shape, resolves options against an explicit `Defaults`, and
// runs on a fresh libjpeg-turbo codec that is dropped when the call ends.

use crate::codecs::{JpegCodec, JpegHeader, TurboJpegCodec};
use crate::engine::buffer::{self, Frame, Raster};
use crate::engine::crop;
use crate::engine::decoder::{self, check_dimensions};
use crate::engine::encoder::{self, Encoded};
use crate::engine::pipeline::{self, Decompressed};
use crate::engine::resample;
use crate::engine::scale;
use crate::engine::{PixelFormat, Subsampling};
use crate::error::{PipelineError, Result};
use crate::ops::{CropOptions, DecodeRequest, Defaults, EncodeRequest, Options, ScaleMode};

#[cfg(feature = "napi")]
use crate::error::napi_error_with_code;
#[cfg(feature = "napi")]
use napi::bindgen_prelude::Buffer;
#[cfg(feature = "napi")]
use napi::Env;

/// Build the decode request described by `options`.
pub fn decode_request(options: &Options, defaults: &Defaults) -> Result<DecodeRequest> {
    let mut request = DecodeRequest::new(options.pixel_format(defaults)?);
    if let Some(crop) = options.crop.as_ref() {
        request = request.with_crop(crop.to_request());
    }
    if let Some(scale) = options.scale.as_ref() {
        request = request.with_scale(scale.to_request(defaults)?);
    }
    Ok(request)
}

fn raw_dimension(name: &'static str, value: Option<u32>, len: usize, bpp: usize) -> Result<Option<u32>> {
    match value {
        None => Ok(None),
        Some(0) => Err(PipelineError::invalid_argument(name, "0", "Must be non-zero")),
        Some(dim) if dim as usize * bpp > len => Err(PipelineError::invalid_argument(
            name,
            dim.to_string(),
            format!("A single {name} line needs {} bytes, input has {len}", dim as usize * bpp),
        )),
        Some(dim) => Ok(Some(dim)),
    }
}

fn derive_dimension(len: usize, other: u32, bpp: usize) -> u32 {
    u32::try_from(len / (other as usize * bpp)).unwrap_or(u32::MAX)
}

/// Dimensions of a raw input of `len` bytes.
///
/// At least one of width/height is required; the other is derived from the
/// input length.
pub fn raw_dimensions(len: usize, options: &Options, format: PixelFormat) -> Result<(u32, u32)> {
    let bpp = format.bytes_per_pixel();
    let width = raw_dimension("width", options.width, len, bpp)?;
    let height = raw_dimension("height", options.height, len, bpp)?;
    let (width, height) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, derive_dimension(len, w, bpp)),
        (None, Some(h)) => (derive_dimension(len, h, bpp), h),
        (None, None) => {
            return Err(PipelineError::invalid_argument(
                "width",
                "undefined",
                "Width or height is required for raw input",
            ))
        }
    };
    check_dimensions(width, height)?;
    let required = buffer::required_buffer_size(width, height, format)?;
    if required > len {
        return Err(PipelineError::invalid_argument(
            "input",
            len.to_string(),
            format!("Input buffer too small: {width}x{height} needs {required} bytes"),
        ));
    }
    Ok((width, height))
}

/// Subsampling for an encode: explicit option, else GRAY for 1-byte input,
/// else the configured default.
pub fn encode_subsampling(options: &Options, format: PixelFormat, defaults: &Defaults) -> Result<Subsampling> {
    Ok(match options.subsampling()? {
        Some(subsampling) => subsampling,
        None if format.bytes_per_pixel() == 1 => Subsampling::Gray,
        None => defaults.subsampling,
    })
}

/// Build the encode request for `len` bytes of raw input.
pub fn encode_request(len: usize, options: &Options, defaults: &Defaults) -> Result<EncodeRequest> {
    let format = options.pixel_format(defaults)?;
    let (width, height) = raw_dimensions(len, options, format)?;
    Ok(EncodeRequest {
        width,
        height,
        pitch: options.pitch.unwrap_or(width),
        format,
        quality: options.quality(defaults)?,
        subsampling: encode_subsampling(options, format, defaults)?,
    })
}

/// Decode a JPEG, optionally cropping and scaling it on the way.
pub fn decompress<'a>(
    jpeg: &[u8],
    out: Option<&'a mut [u8]>,
    options: &Options,
    defaults: &Defaults,
) -> Result<Decompressed<'a>> {
    let request = decode_request(options, defaults)?;
    let mut codec = TurboJpegCodec::new();
    pipeline::decompress(&mut codec, jpeg, &request, out)
}

/// Encode raw pixels to a JPEG.
pub fn compress<'a>(
    pixels: &[u8],
    out: Option<&'a mut [u8]>,
    options: &Options,
    defaults: &Defaults,
) -> Result<Encoded<'a>> {
    let request = encode_request(pixels.len(), options, defaults)?;
    let mut codec = TurboJpegCodec::new();
    encoder::compress(&mut codec, pixels, &request, out)
}

/// Pixel-exact crop of a raw image.
pub fn crop<'a>(
    pixels: &[u8],
    out: Option<&'a mut [u8]>,
    options: &Options,
    defaults: &Defaults,
) -> Result<Raster<'a>> {
    let format = options.pixel_format(defaults)?;
    let (width, height) = raw_dimensions(pixels.len(), options, format)?;
    let request = options
        .crop
        .as_ref()
        .map(CropOptions::to_request)
        .unwrap_or_default();
    let rect = crop::resolve(&request, width, height)?;

    let storage = buffer::plan(
        buffer::required_buffer_size(rect.width, rect.height, format)?,
        out,
    )?;
    let mut output = Raster::new(storage, rect.width, rect.height, format)?;
    let src = Frame::new(pixels, width, height, format.bytes_per_pixel())?;
    crop::trim(src, rect, output.frame_mut())?;
    Ok(output)
}

/// Resample a raw image. Fast mode needs the codec and is rejected here.
pub fn scale<'a>(
    pixels: &[u8],
    out: Option<&'a mut [u8]>,
    options: &Options,
    defaults: &Defaults,
) -> Result<Raster<'a>> {
    let format = options.pixel_format(defaults)?;
    let (width, height) = raw_dimensions(pixels.len(), options, format)?;
    let request = options
        .scale
        .as_ref()
        .map(|s| s.to_request(defaults))
        .transpose()?
        .filter(|s| s.is_requested())
        .ok_or_else(|| {
            PipelineError::invalid_argument("scale", "0x0", "Nothing to scale")
        })?;
    if request.mode == ScaleMode::Fast {
        return Err(PipelineError::invalid_argument(
            "scale.mode",
            ScaleMode::Fast.name(),
            "Mode only available while decompressing",
        ));
    }

    let plan = scale::plan(&request, width, height, &[])?;
    let storage = buffer::plan(
        buffer::required_buffer_size(plan.width, plan.height, format)?,
        out,
    )?;
    let mut output = Raster::new(storage, plan.width, plan.height, format)?;
    let src = Frame::new(pixels, width, height, format.bytes_per_pixel())?;
    resample::resample(src, plan.mode, output.frame_mut())?;
    Ok(output)
}

/// Dimensions and subsampling of a JPEG, without decoding pixels.
pub fn header(jpeg: &[u8]) -> Result<JpegHeader> {
    decoder::inspect(&mut TurboJpegCodec::new(), jpeg)
}

/// Worst-case encoded size for `options.width` x `options.height`.
pub fn buffer_size(options: &Options, defaults: &Defaults) -> Result<usize> {
    let (Some(width @ 1..), Some(height @ 1..)) = (options.width, options.height) else {
        return Err(PipelineError::invalid_argument(
            "width/height",
            format!("{:?}x{:?}", options.width, options.height),
            "Width and height are required and must be non-zero",
        ));
    };
    let subsampling = options.subsampling()?.unwrap_or(defaults.subsampling);
    TurboJpegCodec::new().encoded_buffer_size(width, height, subsampling)
}

pub use crate::engine::format::bytes_per_pixel;

// =============================================================================
// DETACHED RESULTS
// =============================================================================

/// Which host operation a deferred call runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Decompress,
    Compress,
    Crop,
    Scale,
}

/// Output of a finished operation, detached from any caller buffer.
/// `data` is `None` when the bytes went into the caller's destination.
#[derive(Debug)]
pub enum Finished {
    Decoded {
        data: Option<Vec<u8>>,
        length: usize,
        width: u32,
        height: u32,
        format: PixelFormat,
        subsampling: Subsampling,
    },
    Encoded {
        data: Option<Vec<u8>>,
        length: usize,
        subsampling: Subsampling,
    },
    Raw {
        data: Option<Vec<u8>>,
        length: usize,
        width: u32,
        height: u32,
        format: PixelFormat,
    },
}

impl Finished {
    pub fn decoded(result: Decompressed<'_>) -> Self {
        let (length, width, height, format, subsampling) = (
            result.length(),
            result.width(),
            result.height(),
            result.format(),
            result.subsampling,
        );
        Finished::Decoded {
            data: result.into_storage().into_owned(),
            length,
            width,
            height,
            format,
            subsampling,
        }
    }

    pub fn encoded(result: Encoded<'_>) -> Self {
        Finished::Encoded {
            length: result.length,
            subsampling: result.subsampling,
            data: result.data.into_owned(),
        }
    }

    pub fn raw(result: Raster<'_>) -> Self {
        let (length, width, height, format) =
            (result.byte_len(), result.width(), result.height(), result.format());
        Finished::Raw {
            data: result.into_storage().into_owned(),
            length,
            width,
            height,
            format,
        }
    }

    pub fn length(&self) -> usize {
        match self {
            Finished::Decoded { length, .. }
            | Finished::Encoded { length, .. }
            | Finished::Raw { length, .. } => *length,
        }
    }

    /// Bytes the pipeline allocated, if it did not write into the caller's buffer.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Finished::Decoded { data, .. }
            | Finished::Encoded { data, .. }
            | Finished::Raw { data, .. } => data.as_deref(),
        }
    }
}

/// Run `operation` and detach its result. Sync and deferred host calls share this.
pub fn run(
    operation: Operation,
    input: &[u8],
    out: Option<&mut [u8]>,
    options: &Options,
    defaults: &Defaults,
) -> Result<Finished> {
    match operation {
        Operation::Decompress => decompress(input, out, options, defaults).map(Finished::decoded),
        Operation::Compress => compress(input, out, options, defaults).map(Finished::encoded),
        Operation::Crop => crop(input, out, options, defaults).map(Finished::raw),
        Operation::Scale => scale(input, out, options, defaults).map(Finished::raw),
    }
}

// =============================================================================
// NODE.JS BINDING
// =============================================================================

/// Decoded pixels. `data` is the caller's buffer when one was passed in.
#[cfg(feature = "napi")]
#[napi(object)]
pub struct DecodeResult {
    pub data: Buffer,
    pub length: u32,
    pub width: u32,
    pub height: u32,
    pub format: u32,
    pub bpp: u32,
    pub subsampling: u32,
}

/// Encoded JPEG. Only the first `length` bytes of `data` are meaningful.
#[cfg(feature = "napi")]
#[napi(object)]
pub struct EncodeResult {
    pub data: Buffer,
    pub length: u32,
    pub subsampling: u32,
}

/// Raw pixels produced by `crop`/`scale`.
#[cfg(feature = "napi")]
#[napi(object)]
pub struct RawResult {
    pub data: Buffer,
    pub length: u32,
    pub width: u32,
    pub height: u32,
    pub format: u32,
    pub bpp: u32,
}

#[cfg(feature = "napi")]
#[napi(object)]
pub struct HeaderResult {
    pub width: u32,
    pub height: u32,
    pub subsampling: u32,
}

#[cfg(feature = "napi")]
pub(crate) fn js_error(env: &Env, err: PipelineError) -> napi::Error {
    napi_error_with_code(env, err.clone()).unwrap_or_else(|_| napi::Error::from(err))
}

// Pipeline-allocated bytes win; otherwise hand back the caller's destination.
#[cfg(feature = "napi")]
fn js_data(data: Option<Vec<u8>>, out: Option<Buffer>) -> napi::Result<Buffer> {
    match (data, out) {
        (Some(bytes), _) => Ok(Buffer::from(bytes)),
        (None, Some(out)) => Ok(out),
        (None, None) => Err(napi::Error::from_reason("result has no output buffer")),
    }
}

#[cfg(feature = "napi")]
fn js_size(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(feature = "napi")]
impl Finished {
    pub(crate) fn into_decode_result(self, out: Option<Buffer>) -> napi::Result<DecodeResult> {
        match self {
            Finished::Decoded {
                data,
                length,
                width,
                height,
                format,
                subsampling,
            } => Ok(DecodeResult {
                data: js_data(data, out)?,
                length: js_size(length),
                width,
                height,
                format: format.code(),
                bpp: format.bytes_per_pixel() as u32,
                subsampling: subsampling.code(),
            }),
            _ => Err(napi::Error::from_reason("expected a decode result")),
        }
    }

    pub(crate) fn into_encode_result(self, out: Option<Buffer>) -> napi::Result<EncodeResult> {
        match self {
            Finished::Encoded {
                data,
                length,
                subsampling,
            } => Ok(EncodeResult {
                data: js_data(data, out)?,
                length: js_size(length),
                subsampling: subsampling.code(),
            }),
            _ => Err(napi::Error::from_reason("expected an encode result")),
        }
    }

    pub(crate) fn into_raw_result(self, out: Option<Buffer>) -> napi::Result<RawResult> {
        match self {
            Finished::Raw {
                data,
                length,
                width,
                height,
                format,
            } => Ok(RawResult {
                data: js_data(data, out)?,
                length: js_size(length),
                width,
                height,
                format: format.code(),
                bpp: format.bytes_per_pixel() as u32,
            }),
            _ => Err(napi::Error::from_reason("expected a raw result")),
        }
    }
}

#[cfg(feature = "napi")]
fn run_sync(
    env: &Env,
    operation: Operation,
    input: &[u8],
    out: &mut Option<Buffer>,
    options: Option<Options>,
) -> napi::Result<Finished> {
    let options = options.unwrap_or_default();
    run(operation, input, out.as_deref_mut(), &options, &Defaults::default())
        .map_err(|e| js_error(env, e))
}

/// Decode a JPEG. Writes into `out` when given and returns it as `data`.
#[cfg(feature = "napi")]
#[napi(js_name = "decompressSync")]
pub fn decompress_sync(
    env: Env,
    input: Buffer,
    mut out: Option<Buffer>,
    options: Option<Options>,
) -> napi::Result<DecodeResult> {
    let result = run_sync(&env, Operation::Decompress, &input, &mut out, options)?;
    result.into_decode_result(out)
}

#[cfg(feature = "napi")]
#[napi(js_name = "compressSync")]
pub fn compress_sync(
    env: Env,
    input: Buffer,
    mut out: Option<Buffer>,
    options: Option<Options>,
) -> napi::Result<EncodeResult> {
    let result = run_sync(&env, Operation::Compress, &input, &mut out, options)?;
    result.into_encode_result(out)
}

#[cfg(feature = "napi")]
#[napi(js_name = "cropSync")]
pub fn crop_sync(
    env: Env,
    input: Buffer,
    mut out: Option<Buffer>,
    options: Option<Options>,
) -> napi::Result<RawResult> {
    let result = run_sync(&env, Operation::Crop, &input, &mut out, options)?;
    result.into_raw_result(out)
}

#[cfg(feature = "napi")]
#[napi(js_name = "scaleSync")]
pub fn scale_sync(
    env: Env,
    input: Buffer,
    mut out: Option<Buffer>,
    options: Option<Options>,
) -> napi::Result<RawResult> {
    let result = run_sync(&env, Operation::Scale, &input, &mut out, options)?;
    result.into_raw_result(out)
}

#[cfg(feature = "napi")]
#[napi(js_name = "headerSync")]
pub fn header_sync(env: Env, input: Buffer) -> napi::Result<HeaderResult> {
    let header = header(&input).map_err(|e| js_error(&env, e))?;
    Ok(HeaderResult {
        width: header.width,
        height: header.height,
        subsampling: header.subsampling.code(),
    })
}

#[cfg(feature = "napi")]
#[napi(js_name = "bufferSize")]
pub fn buffer_size_js(env: Env, options: Options) -> napi::Result<u32> {
    buffer_size(&options, &Defaults::default())
        .map(js_size)
        .map_err(|e| js_error(&env, e))
}

#[cfg(feature = "napi")]
#[napi(js_name = "getBpp")]
pub fn get_bpp(env: Env, format: i64) -> napi::Result<u32> {
    bytes_per_pixel(format)
        .map(|bpp| bpp as u32)
        .map_err(|e| js_error(&env, e))
}

#[cfg(feature = "napi")]
#[napi(js_name = "formatName")]
pub fn format_name(env: Env, format: i64) -> napi::Result<String> {
    PixelFormat::from_code(format)
        .map(|f| f.name().to_string())
        .map_err(|e| js_error(&env, e))
}

#[cfg(feature = "napi")]
#[napi(js_name = "subsamplingName")]
pub fn subsampling_name(env: Env, subsampling: i64) -> napi::Result<String> {
    Subsampling::from_code(subsampling)
        .map(|s| s.name().to_string())
        .map_err(|e| js_error(&env, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ops::ScaleOptions;

    fn raw(width: Option<u32>, height: Option<u32>, format: u32) -> Options {
        Options {
            width,
            height,
            format: Some(format),
            ..Default::default()
        }
    }

    #[test]
    fn test_raw_dimensions_derive_missing_side() {
        let rgb = PixelFormat::Rgb;
        assert_eq!(raw_dimensions(300, &raw(Some(10), None, 0), rgb).unwrap(), (10, 10));
        assert_eq!(raw_dimensions(300, &raw(None, Some(5), 0), rgb).unwrap(), (20, 5));
        assert_eq!(raw_dimensions(300, &raw(Some(10), Some(10), 0), rgb).unwrap(), (10, 10));
    }

    #[test]
    fn test_raw_dimensions_rejections() {
        let rgb = PixelFormat::Rgb;
        for options in [
            raw(None, None, 0),
            raw(Some(0), None, 0),
            raw(Some(101), None, 0),
            raw(Some(10), Some(11), 0),
        ] {
            let err = raw_dimensions(300, &options, rgb).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{options:?}");
        }
    }

    #[test]
    fn test_gray_input_defaults_to_gray_subsampling() {
        let d = Defaults::default();
        let gray = raw(Some(8), Some(8), PixelFormat::Gray.code());
        assert_eq!(encode_subsampling(&gray, PixelFormat::Gray, &d).unwrap(), Subsampling::Gray);
        let rgb = raw(Some(8), Some(8), 0);
        assert_eq!(encode_subsampling(&rgb, PixelFormat::Rgb, &d).unwrap(), Subsampling::S420);
        let explicit = Options {
            subsampling: Some(0),
            ..gray
        };
        assert_eq!(
            encode_subsampling(&explicit, PixelFormat::Gray, &d).unwrap(),
            Subsampling::S444
        );
    }

    #[test]
    fn test_encode_request_defaults() {
        let request = encode_request(4 * 6 * 4, &raw(Some(4), None, 7), &Defaults::default()).unwrap();
        assert_eq!((request.width, request.height, request.pitch), (4, 6, 4));
        assert_eq!(request.quality, 80);
        assert_eq!(request.format, PixelFormat::Rgba);
    }

    #[test]
    fn test_raw_crop() {
        // 4x3 gray image with value = 10 * y + x
        let pixels: Vec<u8> = (0..3).flat_map(|y| (0..4).map(move |x| 10 * y + x)).collect();
        let options = Options {
            crop: Some(CropOptions {
                x: Some(1),
                y: Some(1),
                width: Some(-1),
                ..Default::default()
            }),
            ..raw(Some(4), None, PixelFormat::Gray.code())
        };
        let result = crop(&pixels, None, &options, &Defaults::default()).unwrap();
        assert_eq!((result.width(), result.height()), (2, 2));
        assert_eq!(result.pixels(), &[11, 12, 21, 22]);
    }

    #[test]
    fn test_raw_crop_out_of_bounds() {
        let pixels = [0u8; 16];
        let options = Options {
            crop: Some(CropOptions {
                x: Some(4),
                ..Default::default()
            }),
            ..raw(Some(4), Some(4), PixelFormat::Gray.code())
        };
        let err = crop(&pixels, None, &options, &Defaults::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CropOutOfBounds);
    }

    #[test]
    fn test_raw_scale() {
        let pixels = vec![200u8; 8 * 4 * 3];
        let options = Options {
            scale: Some(ScaleOptions {
                width: Some(4),
                mode: Some(ScaleMode::Bilinear.code()),
                ..Default::default()
            }),
            ..raw(Some(8), Some(4), 0)
        };
        let mut out = vec![0u8; 4 * 2 * 3];
        let result = scale(&pixels, Some(&mut out), &options, &Defaults::default()).unwrap();
        assert_eq!((result.width(), result.height()), (4, 2));
        assert!(result.storage().is_borrowed());
        drop(result);
        assert!(out.iter().all(|&b| b == 200));
    }

    #[test]
    fn test_raw_scale_rejections() {
        let d = Defaults::default();
        let pixels = vec![0u8; 8 * 8];
        let base = raw(Some(8), Some(8), PixelFormat::Gray.code());

        let err = scale(&pixels, None, &base, &d).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("Nothing to scale"));

        let fast = Options {
            scale: Some(ScaleOptions {
                width: Some(4),
                ..Default::default()
            }),
            ..base.clone()
        };
        let err = scale(&pixels, None, &fast, &d).unwrap_err();
        assert!(err.to_string().contains("only available while decompressing"));

        let too_small = Options {
            scale: Some(ScaleOptions {
                width: Some(-8),
                mode: Some(ScaleMode::Nearest.code()),
                ..Default::default()
            }),
            ..base
        };
        let err = scale(&pixels, None, &too_small, &d).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ScaleTooSmall);
    }

    #[test]
    fn test_run_writes_into_destination() {
        let pixels: Vec<u8> = (0..16).collect();
        let options = Options {
            crop: Some(CropOptions {
                x: Some(2),
                y: Some(2),
                ..Default::default()
            }),
            ..raw(Some(4), Some(4), PixelFormat::Gray.code())
        };
        let mut out = [0u8; 6];
        let finished =
            run(Operation::Crop, &pixels, Some(&mut out), &options, &Defaults::default()).unwrap();
        assert!(finished.data().is_none());
        assert_eq!(finished.length(), 4);
        assert!(matches!(
            finished,
            Finished::Raw { width: 2, height: 2, format: PixelFormat::Gray, .. }
        ));
        assert_eq!(out, [10, 11, 14, 15, 0, 0]);
    }

    #[test]
    fn test_run_rejects_short_destination() {
        let pixels = vec![9u8; 8 * 8 * 3];
        let options = Options {
            scale: Some(ScaleOptions {
                width: Some(4),
                mode: Some(ScaleMode::Nearest.code()),
                ..Default::default()
            }),
            ..raw(Some(8), Some(8), 0)
        };
        let mut out = [0u8; 10];
        let err = run(Operation::Scale, &pixels, Some(&mut out), &options, &Defaults::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
        assert_eq!(out, [0u8; 10]);
    }

    #[test]
    fn test_run_allocates_without_destination() {
        let pixels = vec![5u8; 6 * 2 * 4];
        let options = raw(Some(6), Some(2), PixelFormat::Bgra.code());
        let finished = run(Operation::Crop, &pixels, None, &options, &Defaults::default()).unwrap();
        assert_eq!(finished.length(), 48);
        assert_eq!(finished.data(), Some(&pixels[..]));
    }

    #[test]
    fn test_buffer_size_requires_dimensions() {
        let d = Defaults::default();
        let err = buffer_size(&raw(Some(10), None, 0), &d).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_decode_request_from_options() {
        let d = Defaults::default();
        let options = Options {
            format: Some(PixelFormat::Bgr.code()),
            crop: Some(CropOptions {
                width: Some(10),
                precise: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let request = decode_request(&options, &d).unwrap();
        assert_eq!(request.format, PixelFormat::Bgr);
        assert!(request.crop.is_some_and(|c| c.precise && c.width == 10));
        assert!(request.scale.is_none());
    }
}
