// src/engine/encoder.rs
//
// Encode direction: validate the raw layout, size the output from the
// codec's worst-case bound, encode, and report the bytes actually used.

use crate::codecs::{EncodeLayout, JpegCodec};
use crate::engine::buffer::{self, Storage};
use crate::engine::decoder::check_dimensions;
use crate::engine::Subsampling;
use crate::error::{PipelineError, Result};
use crate::ops::EncodeRequest;
use tracing::debug;

/// A finished encode. `length` is the number of meaningful bytes in `data`;
/// a caller-supplied buffer keeps its full length.
#[derive(Debug)]
pub struct Encoded<'a> {
    pub data: Storage<'a>,
    pub length: usize,
    pub subsampling: Subsampling,
}

impl Encoded<'_> {
    pub fn bytes(&self) -> &[u8] {
        &self.data.as_slice()[..self.length]
    }
}

/// Bytes a `pitch`-strided image must supply: every full row but the last,
/// plus the visible part of the last one.
pub fn required_input_len(request: &EncodeRequest) -> Result<usize> {
    let bpp = request.format.bytes_per_pixel();
    let overflow = || {
        PipelineError::invalid_argument(
            "pitch",
            request.pitch.to_string(),
            format!("Row pitch times {} rows overflows", request.height),
        )
    };
    let stride = (request.pitch as usize).checked_mul(bpp).ok_or_else(overflow)?;
    let visible = request.width as usize * bpp;
    stride
        .checked_mul(request.height.saturating_sub(1) as usize)
        .and_then(|rows| rows.checked_add(visible))
        .ok_or_else(overflow)
}

fn validate(pixels: &[u8], request: &EncodeRequest) -> Result<()> {
    if request.width == 0 || request.height == 0 {
        return Err(PipelineError::invalid_argument(
            "dimensions",
            format!("{}x{}", request.width, request.height),
            "Width and height must be non-zero",
        ));
    }
    check_dimensions(request.width, request.height)?;
    if request.pitch < request.width {
        return Err(PipelineError::invalid_argument(
            "pitch",
            request.pitch.to_string(),
            format!("Pitch must be at least the width ({})", request.width),
        ));
    }
    if !(1..=100).contains(&request.quality) {
        return Err(PipelineError::invalid_argument(
            "quality",
            request.quality.to_string(),
            "Quality must be between 1 and 100",
        ));
    }
    let required = required_input_len(request)?;
    if pixels.len() < required {
        return Err(PipelineError::buffer_too_small("Input", required, pixels.len()));
    }
    Ok(())
}

/// Encode raw pixels to a baseline JPEG.
///
/// A caller buffer must hold the codec's worst-case size for this geometry
/// even if the actual result is smaller. Without one, the output is
/// allocated at that size and shrunk to the bytes used.
pub fn compress<'a, C: JpegCodec + ?Sized>(
    codec: &mut C,
    pixels: &[u8],
    request: &EncodeRequest,
    out: Option<&'a mut [u8]>,
) -> Result<Encoded<'a>> {
    validate(pixels, request)?;

    let capacity = codec.encoded_buffer_size(request.width, request.height, request.subsampling)?;
    let mut data = buffer::plan(capacity, out)?;

    let layout = EncodeLayout {
        width: request.width,
        height: request.height,
        row_stride: request.pitch as usize * request.format.bytes_per_pixel(),
        format: request.format,
        quality: request.quality,
        subsampling: request.subsampling,
    };
    let length = codec.encode(pixels, &layout, data.as_mut_slice())?;
    data.truncate(length);

    debug!(
        target: "jpeg_pipeline::pipeline",
        width = request.width,
        height = request.height,
        quality = request.quality,
        subsampling = request.subsampling.name(),
        capacity,
        length,
        "encoded"
    );

    Ok(Encoded {
        data,
        length,
        subsampling: request.subsampling,
    })
}
