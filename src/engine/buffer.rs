// src/engine/buffer.rs
//
// Buffer planning: exact sizes up front, caller buffers validated (never resized),
// pipeline buffers allocated fallibly and owned by exactly one invocation.

use crate::engine::format::{PixelFormat, Subsampling};
use crate::error::{PipelineError, Result};
use tracing::debug;

/// Who owns the bytes behind a raster.
///
/// `Borrowed` is the caller's destination and is only ever written into.
/// `OwnedTemporary` lives for one stage of one invocation. `OwnedFinal` is
/// handed to the caller on success.
#[derive(Debug)]
pub enum Storage<'a> {
    Borrowed(&'a mut [u8]),
    OwnedTemporary(Vec<u8>),
    OwnedFinal(Vec<u8>),
}

impl<'a> Storage<'a> {
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self, Storage::Borrowed(_))
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Borrowed(buf) => &buf[..],
            Storage::OwnedTemporary(buf) | Storage::OwnedFinal(buf) => &buf[..],
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Storage::Borrowed(buf) => &mut buf[..],
            Storage::OwnedTemporary(buf) | Storage::OwnedFinal(buf) => &mut buf[..],
        }
    }

    /// Shrink an owned buffer to the bytes actually produced.
    /// Borrowed buffers keep their length; the caller reads `used` bytes.
    pub fn truncate(&mut self, used: usize) {
        match self {
            Storage::Borrowed(_) => {}
            Storage::OwnedTemporary(buf) | Storage::OwnedFinal(buf) => buf.truncate(used),
        }
    }

    /// Take the pipeline-allocated bytes, if any.
    pub fn into_owned(self) -> Option<Vec<u8>> {
        match self {
            Storage::Borrowed(_) => None,
            Storage::OwnedTemporary(buf) | Storage::OwnedFinal(buf) => Some(buf),
        }
    }
}

/// Read-only view of packed pixels, rows `width * bpp` bytes apart.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub bpp: usize,
}

/// Writable view of packed pixels.
#[derive(Debug)]
pub struct FrameMut<'a> {
    pub pixels: &'a mut [u8],
    pub width: u32,
    pub height: u32,
    pub bpp: usize,
}

fn frame_len(width: u32, height: u32, bpp: usize) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(bpp))
        .ok_or_else(|| {
            PipelineError::invalid_argument(
                "dimensions",
                format!("{width}x{height}x{bpp}"),
                "Buffer size overflows usize",
            )
        })
}

impl<'a> Frame<'a> {
    pub fn new(pixels: &'a [u8], width: u32, height: u32, bpp: usize) -> Result<Self> {
        let required = frame_len(width, height, bpp)?;
        if pixels.len() < required {
            return Err(PipelineError::buffer_too_small("Input", required, pixels.len()));
        }
        Ok(Self {
            pixels,
            width,
            height,
            bpp,
        })
    }

    pub fn stride(&self) -> usize {
        self.width as usize * self.bpp
    }

    pub fn row(&self, y: u32) -> &'a [u8] {
        let start = y as usize * self.stride();
        &self.pixels[start..start + self.stride()]
    }
}

impl<'a> FrameMut<'a> {
    pub fn new(pixels: &'a mut [u8], width: u32, height: u32, bpp: usize) -> Result<Self> {
        let required = frame_len(width, height, bpp)?;
        if pixels.len() < required {
            return Err(PipelineError::buffer_too_small("Output", required, pixels.len()));
        }
        Ok(Self {
            pixels,
            width,
            height,
            bpp,
        })
    }

    pub fn stride(&self) -> usize {
        self.width as usize * self.bpp
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &mut self.pixels[start..start + stride]
    }
}

/// Pixel storage plus the geometry it holds.
/// Invariant: `storage.len() >= width * height * bpp`.
#[derive(Debug)]
pub struct Raster<'a> {
    storage: Storage<'a>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl<'a> Raster<'a> {
    pub fn new(storage: Storage<'a>, width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let required = required_buffer_size(width, height, format)?;
        if storage.len() < required {
            return Err(PipelineError::buffer_too_small("Raster", required, storage.len()));
        }
        Ok(Self {
            storage,
            width,
            height,
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    /// Bytes of pixel data, excluding any slack in a larger caller buffer.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.bytes_per_pixel()
    }

    pub fn pixels(&self) -> &[u8] {
        &self.storage.as_slice()[..self.byte_len()]
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        let len = self.byte_len();
        &mut self.storage.as_mut_slice()[..len]
    }

    pub fn storage(&self) -> &Storage<'a> {
        &self.storage
    }

    pub fn into_storage(self) -> Storage<'a> {
        self.storage
    }

    pub fn frame(&self) -> Frame<'_> {
        Frame {
            pixels: self.pixels(),
            width: self.width,
            height: self.height,
            bpp: self.bytes_per_pixel(),
        }
    }

    pub fn frame_mut(&mut self) -> FrameMut<'_> {
        let (width, height, bpp) = (self.width, self.height, self.bytes_per_pixel());
        FrameMut {
            pixels: self.pixels_mut(),
            width,
            height,
            bpp,
        }
    }
}

/// `width * height * bytes_per_pixel(format)`, overflow-checked.
pub fn required_buffer_size(width: u32, height: u32, format: PixelFormat) -> Result<usize> {
    frame_len(width, height, format.bytes_per_pixel())
}

fn allocate(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| PipelineError::allocation_failure(len))?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Destination for the last stage: the caller's buffer if it is large
/// enough, otherwise a fresh allocation of exactly `required` bytes.
pub fn plan<'a>(required: usize, caller: Option<&'a mut [u8]>) -> Result<Storage<'a>> {
    match caller {
        Some(buf) => {
            if buf.len() < required {
                return Err(PipelineError::buffer_too_small("Output", required, buf.len()));
            }
            debug!(
                target: "jpeg_pipeline::pipeline",
                required,
                supplied = buf.len(),
                "borrowing caller output buffer"
            );
            Ok(Storage::Borrowed(buf))
        }
        None => {
            debug!(target: "jpeg_pipeline::pipeline", required, "allocating output buffer");
            allocate(required).map(Storage::OwnedFinal)
        }
    }
}

/// Capacity check alone, for validating a caller buffer before any codec call.
pub fn check_capacity(required: usize, caller: Option<&[u8]>) -> Result<()> {
    match caller {
        Some(buf) if buf.len() < required => {
            Err(PipelineError::buffer_too_small("Output", required, buf.len()))
        }
        _ => Ok(()),
    }
}

/// Scratch raster for an intermediate stage.
pub fn temporary(width: u32, height: u32, format: PixelFormat) -> Result<Raster<'static>> {
    let len = required_buffer_size(width, height, format)?;
    debug!(
        target: "jpeg_pipeline::pipeline",
        width, height, len, "allocating stage buffer"
    );
    Raster::new(Storage::OwnedTemporary(allocate(len)?), width, height, format)
}

/// Worst-case size of a baseline JPEG for the given geometry.
///
/// Same bound as libjpeg-turbo's `tjBufSize`: dimensions padded to whole
/// MCUs, two bytes per luma sample plus the chroma share, plus header slack.
pub fn encoded_capacity(width: u32, height: u32, subsampling: Subsampling) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(PipelineError::invalid_argument(
            "dimensions",
            format!("{width}x{height}"),
            "Width and height must be non-zero",
        ));
    }
    let (mcu_w, mcu_h) = subsampling.mcu_size();
    let chroma_share = match subsampling {
        Subsampling::Gray => 0,
        _ => 4 * 64 / (mcu_w as u64 * mcu_h as u64),
    };
    let padded_w = (width as u64).div_ceil(mcu_w as u64) * mcu_w as u64;
    let padded_h = (height as u64).div_ceil(mcu_h as u64) * mcu_h as u64;
    let bytes = padded_w * padded_h * (2 + chroma_share) + 2048;
    usize::try_from(bytes).map_err(|_| {
        PipelineError::invalid_argument(
            "dimensions",
            format!("{width}x{height}"),
            "Encoded size overflows usize",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_buffer_size() {
        assert_eq!(required_buffer_size(10, 10, PixelFormat::Rgba).unwrap(), 400);
        assert_eq!(required_buffer_size(10, 10, PixelFormat::Gray).unwrap(), 100);
        assert_eq!(required_buffer_size(0, 10, PixelFormat::Rgb).unwrap(), 0);
    }

    #[test]
    fn test_plan_rejects_short_caller_buffer() {
        let mut buf = [7u8; 10];
        let err = plan(1000, Some(&mut buf)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BufferTooSmall);
        assert!(buf.iter().all(|&b| b == 7));
    }

    #[test]
    fn test_plan_borrows_large_enough_buffer() {
        let mut buf = vec![0u8; 64];
        let storage = plan(32, Some(&mut buf)).unwrap();
        assert!(storage.is_borrowed());
        // never resized
        assert_eq!(storage.len(), 64);
    }

    #[test]
    fn test_plan_allocates_exact_length() {
        let storage = plan(123, None).unwrap();
        assert!(matches!(storage, Storage::OwnedFinal(_)));
        assert_eq!(storage.len(), 123);
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let err = plan(usize::MAX, None).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::AllocationFailure);
    }

    #[test]
    fn test_raster_ignores_slack() {
        let mut buf = vec![1u8; 100];
        let raster = Raster::new(Storage::Borrowed(&mut buf), 2, 2, PixelFormat::Rgb).unwrap();
        assert_eq!(raster.pixels().len(), 12);
        assert_eq!(raster.storage().len(), 100);
    }

    #[test]
    fn test_raster_requires_capacity() {
        let err = Raster::new(Storage::OwnedTemporary(vec![0; 11]), 2, 2, PixelFormat::Rgb)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BufferTooSmall);
    }

    #[test]
    fn test_encoded_capacity_matches_turbojpeg_bound() {
        // 4:2:0 pads to 16x16 MCUs and adds one chroma byte per pixel
        assert_eq!(encoded_capacity(100, 100, Subsampling::S420).unwrap(), 112 * 112 * 3 + 2048);
        assert_eq!(encoded_capacity(8, 8, Subsampling::S444).unwrap(), 64 * 6 + 2048);
        assert_eq!(encoded_capacity(8, 8, Subsampling::Gray).unwrap(), 64 * 2 + 2048);
        assert!(encoded_capacity(0, 8, Subsampling::Gray).is_err());
    }

    #[test]
    fn test_truncate_only_touches_owned() {
        let mut owned = Storage::OwnedFinal(vec![0; 10]);
        owned.truncate(4);
        assert_eq!(owned.len(), 4);

        let mut buf = [0u8; 10];
        let mut borrowed = Storage::Borrowed(&mut buf);
        borrowed.truncate(4);
        assert_eq!(borrowed.len(), 10);
    }
}
