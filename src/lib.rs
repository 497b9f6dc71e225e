// lib.rs
//
// jpeg-pipeline: JPEG decode/encode with lossless crop, native DCT scaling
// and exact resampling, in front of libjpeg-turbo.
//
// Design goals:
// - Plan every stage before allocating
// - Crop in the compressed domain, scale in the decoder when possible
// - Write into caller buffers when given, never resize them
// - Usable from Rust directly or from Node.js (sync and promise APIs)

#[cfg(feature = "napi")]
#[macro_use]
extern crate napi_derive;

// jemalloc is not supported on Windows/MSVC
#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

pub mod codecs;
pub mod engine;
pub mod error;
pub mod ops;

pub use codecs::{JpegCodec, JpegHeader, TurboJpegCodec};
pub use engine::{PixelFormat, Subsampling};
pub use error::{ErrorKind, PipelineError, Result};
pub use ops::{Defaults, Options, ScaleMode};

/// Get library version
#[cfg(feature = "napi")]
#[napi]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// =============================================================================
// HOST CONSTANTS - libjpeg-turbo numbering
// =============================================================================

#[cfg(feature = "napi")]
mod constants {
    use crate::engine::{PixelFormat, Subsampling};
    use crate::ops::{Defaults, ScaleMode};

    #[napi]
    pub const FORMAT_RGB: u32 = PixelFormat::Rgb.code();
    #[napi]
    pub const FORMAT_BGR: u32 = PixelFormat::Bgr.code();
    #[napi]
    pub const FORMAT_RGBX: u32 = PixelFormat::Rgbx.code();
    #[napi]
    pub const FORMAT_BGRX: u32 = PixelFormat::Bgrx.code();
    #[napi]
    pub const FORMAT_XBGR: u32 = PixelFormat::Xbgr.code();
    #[napi]
    pub const FORMAT_XRGB: u32 = PixelFormat::Xrgb.code();
    #[napi]
    pub const FORMAT_GRAY: u32 = PixelFormat::Gray.code();
    #[napi]
    pub const FORMAT_RGBA: u32 = PixelFormat::Rgba.code();
    #[napi]
    pub const FORMAT_BGRA: u32 = PixelFormat::Bgra.code();
    #[napi]
    pub const FORMAT_ABGR: u32 = PixelFormat::Abgr.code();
    #[napi]
    pub const FORMAT_ARGB: u32 = PixelFormat::Argb.code();

    #[napi]
    pub const SAMP_444: u32 = Subsampling::S444.code();
    #[napi]
    pub const SAMP_422: u32 = Subsampling::S422.code();
    #[napi]
    pub const SAMP_420: u32 = Subsampling::S420.code();
    #[napi]
    pub const SAMP_GRAY: u32 = Subsampling::Gray.code();
    #[napi]
    pub const SAMP_440: u32 = Subsampling::S440.code();

    #[napi]
    pub const SCALE_FAST: u32 = ScaleMode::Fast.code();
    #[napi]
    pub const SCALE_NEAREST: u32 = ScaleMode::Nearest.code();
    #[napi]
    pub const SCALE_BILINEAR: u32 = ScaleMode::Bilinear.code();
    #[napi]
    pub const SCALE_BICUBIC: u32 = ScaleMode::Bicubic.code();

    // Defaults::STANDARD as host codes
    #[napi]
    pub const DEFAULT_FORMAT: u32 = Defaults::STANDARD.format.code();
    #[napi]
    pub const DEFAULT_SUBSAMPLING: u32 = Defaults::STANDARD.subsampling.code();
    #[napi]
    pub const DEFAULT_QUALITY: u32 = Defaults::STANDARD.quality as u32;
    #[napi]
    pub const DEFAULT_SCALE: u32 = Defaults::STANDARD.scale_mode.code();
}
