// src/engine.rs
//
// The core of jpeg-pipeline. Every operation:
// 1. Resolves options and plans all stages before touching pixels
// 2. Validates the caller's destination before any codec call
// 3. Runs on a codec handle owned by that one call
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Larger headers are rejected before any buffer is sized.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB of RGBA output.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

pub mod api;
pub mod buffer;
pub mod common;
pub mod crop;
mod decoder;
pub mod encoder;
pub mod format;
pub mod pipeline;
pub mod resample;
pub mod scale;
#[cfg(feature = "napi")]
mod tasks;

pub use buffer::{Raster, Storage};
pub use decoder::{check_dimensions, inspect};
pub use encoder::Encoded;
pub use format::{bytes_per_pixel, PixelFormat, Subsampling};
pub use pipeline::{DecodePlan, Decompressed, Stages};

#[cfg(feature = "napi")]
pub use api::{DecodeResult, EncodeResult, HeaderResult, RawResult};
#[cfg(feature = "napi")]
pub use tasks::{CompressTask, DecompressTask, HeaderTask, RawTask};
