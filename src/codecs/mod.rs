// src/codecs/mod.rs
//
// The codec seam. The pipeline plans and moves buffers; everything that
// touches entropy-coded data goes through `JpegCodec`.

pub mod turbo;

pub use turbo::TurboJpegCodec;

use crate::engine::buffer::encoded_capacity;
use crate::engine::crop::Rect;
use crate::engine::scale::ScalingRatio;
use crate::engine::{PixelFormat, Subsampling};
use crate::error::Result;

/// What a header probe reports, without decoding any pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JpegHeader {
    pub width: u32,
    pub height: u32,
    pub subsampling: Subsampling,
}

/// Geometry and settings of one encode call.
/// `row_stride` is in bytes and may exceed `width * bpp`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeLayout {
    pub width: u32,
    pub height: u32,
    pub row_stride: usize,
    pub format: PixelFormat,
    pub quality: u8,
    pub subsampling: Subsampling,
}

/// A JPEG codec the pipeline can drive.
///
/// Implementations hold their own handles; one value serves one pipeline
/// invocation and is dropped with it.
pub trait JpegCodec {
    /// Dimensions and subsampling. Fails with `CorruptInput`.
    fn probe_header(&mut self, jpeg: &[u8]) -> Result<JpegHeader>;

    /// Cut `rect` out of the compressed stream without re-encoding.
    /// `rect.x`/`rect.y` must sit on MCU boundaries.
    fn lossless_crop(&mut self, jpeg: &[u8], rect: Rect) -> Result<Vec<u8>>;

    /// Decode into `out` at `width` x `height`. A size other than the
    /// native one must be reachable by one of `scaling_ratios()`.
    /// Returns bytes written.
    fn decode(
        &mut self,
        jpeg: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        out: &mut [u8],
    ) -> Result<usize>;

    /// Encode `pixels` into `out`, returning the bytes used.
    fn encode(&mut self, pixels: &[u8], layout: &EncodeLayout, out: &mut [u8]) -> Result<usize>;

    /// Native decode scaling ratios, ascending by output size.
    fn scaling_ratios(&self) -> &[ScalingRatio];

    /// Upper bound on the encoded size of a `width` x `height` image.
    fn encoded_buffer_size(&self, width: u32, height: u32, subsampling: Subsampling) -> Result<usize> {
        encoded_capacity(width, height, subsampling)
    }
}
