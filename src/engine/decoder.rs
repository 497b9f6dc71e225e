// src/engine/decoder.rs
//
// Header inspection and the dimension guard applied before any pixel buffer is sized.

use crate::codecs::{JpegCodec, JpegHeader};
use crate::engine::{MAX_DIMENSION, MAX_PIXELS};
use crate::error::{PipelineError, Result};

/// Reject images whose decoded size would be unreasonable.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(PipelineError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(PipelineError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
    }
    Ok(())
}

/// Probe a JPEG header and apply the dimension guard.
pub fn inspect<C: JpegCodec + ?Sized>(codec: &mut C, jpeg: &[u8]) -> Result<JpegHeader> {
    if jpeg.is_empty() {
        return Err(PipelineError::corrupt_input("empty input"));
    }
    let header = codec.probe_header(jpeg)?;
    if header.width == 0 || header.height == 0 {
        return Err(PipelineError::corrupt_input(format!(
            "zero-sized image {}x{}",
            header.width, header.height
        )));
    }
    check_dimensions(header.width, header.height)?;
    Ok(header)
}
