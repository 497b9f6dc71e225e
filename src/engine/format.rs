// src/engine/format.rs
//
// Pixel format and chroma subsampling tables.
// Numeric codes match libjpeg-turbo (TJPF_* / TJSAMP_*) so hosts can pass them through unchanged.

use crate::error::{PipelineError, Result};

/// Uncompressed pixel layouts the pipeline reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PixelFormat {
    Rgb = 0,
    Bgr = 1,
    Rgbx = 2,
    Bgrx = 3,
    Xbgr = 4,
    Xrgb = 5,
    Gray = 6,
    Rgba = 7,
    Bgra = 8,
    Abgr = 9,
    Argb = 10,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 11] = [
        PixelFormat::Rgb,
        PixelFormat::Bgr,
        PixelFormat::Rgbx,
        PixelFormat::Bgrx,
        PixelFormat::Xbgr,
        PixelFormat::Xrgb,
        PixelFormat::Gray,
        PixelFormat::Rgba,
        PixelFormat::Bgra,
        PixelFormat::Abgr,
        PixelFormat::Argb,
    ];

    pub fn from_code(code: i64) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.code() as i64 == code)
            .ok_or_else(|| PipelineError::invalid_format(code))
    }

    pub const fn code(self) -> u32 {
        self as u32
    }

    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray => 1,
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            _ => 4,
        }
    }

    /// Host-facing constant name, e.g. `FORMAT_RGBA`.
    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgb => "FORMAT_RGB",
            PixelFormat::Bgr => "FORMAT_BGR",
            PixelFormat::Rgbx => "FORMAT_RGBX",
            PixelFormat::Bgrx => "FORMAT_BGRX",
            PixelFormat::Xbgr => "FORMAT_XBGR",
            PixelFormat::Xrgb => "FORMAT_XRGB",
            PixelFormat::Gray => "FORMAT_GRAY",
            PixelFormat::Rgba => "FORMAT_RGBA",
            PixelFormat::Bgra => "FORMAT_BGRA",
            PixelFormat::Abgr => "FORMAT_ABGR",
            PixelFormat::Argb => "FORMAT_ARGB",
        }
    }
}

/// Bytes per pixel for a raw format code.
pub fn bytes_per_pixel(code: i64) -> Result<usize> {
    PixelFormat::from_code(code).map(PixelFormat::bytes_per_pixel)
}

/// Chroma subsampling of a JPEG stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Subsampling {
    S444 = 0,
    S422 = 1,
    S420 = 2,
    Gray = 3,
    S440 = 4,
}

impl Subsampling {
    pub const ALL: [Subsampling; 5] = [
        Subsampling::S444,
        Subsampling::S422,
        Subsampling::S420,
        Subsampling::Gray,
        Subsampling::S440,
    ];

    pub fn from_code(code: i64) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.code() as i64 == code)
            .ok_or_else(|| {
                PipelineError::invalid_argument(
                    "subsampling",
                    code.to_string(),
                    "Expected SAMP_444, SAMP_422, SAMP_420, SAMP_GRAY or SAMP_440",
                )
            })
    }

    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Host-facing constant name, e.g. `SAMP_420`.
    pub const fn name(self) -> &'static str {
        match self {
            Subsampling::S444 => "SAMP_444",
            Subsampling::S422 => "SAMP_422",
            Subsampling::S420 => "SAMP_420",
            Subsampling::Gray => "SAMP_GRAY",
            Subsampling::S440 => "SAMP_440",
        }
    }

    /// Horizontal and vertical chroma decimation factors.
    pub const fn chroma_factors(self) -> (u32, u32) {
        match self {
            Subsampling::S444 | Subsampling::Gray => (1, 1),
            Subsampling::S422 => (2, 1),
            Subsampling::S420 => (2, 2),
            Subsampling::S440 => (1, 2),
        }
    }

    /// MCU size in pixels: one 8x8 DCT block per chroma sample.
    /// Lossless transforms may only cut on these boundaries.
    pub const fn mcu_size(self) -> (u32, u32) {
        let (fx, fy) = self.chroma_factors();
        (8 * fx, 8 * fy)
    }
}
