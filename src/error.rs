// src/error.rs
//
// Unified error handling for jpeg-pipeline
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - UserError: Invalid options, undersized buffers, out-of-range crop/scale
// - CodecError: libjpeg-turbo rejected the bytes or failed mid-call
// - ResourceLimit: Allocation failures and dimension limits
// - InternalBug: Library bugs (should not happen)

#[cfg(feature = "napi")]
use napi::bindgen_prelude::*;
use std::borrow::Cow;
use thiserror::Error;

/// Error taxonomy for proper error handling in JavaScript
///
/// This 4-tier taxonomy enables proper error handling:
/// - UserError: Invalid input, recoverable by user
/// - CodecError: Format/encoding issues
/// - ResourceLimit: Memory/dimension limits
/// - InternalBug: Library bugs (should not happen)
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "napi", napi)]
#[cfg_attr(not(feature = "napi"), derive(Clone, Copy))]
#[repr(u32)]
pub enum ErrorCategory {
    /// Invalid input, recoverable by user
    UserError,
    /// Format/encoding issues
    CodecError,
    /// Memory/dimension limits
    ResourceLimit,
    /// Library bugs (should not happen)
    InternalBug,
}

/// The stable error kinds a host can branch on.
///
/// Several `PipelineError` variants may share a kind; the variant carries the
/// detail, the kind carries the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidFormat,
    BufferTooSmall,
    CropOutOfBounds,
    ScaleTooSmall,
    CorruptInput,
    CodecError,
    AllocationFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::InvalidFormat => "InvalidFormat",
            ErrorKind::BufferTooSmall => "BufferTooSmall",
            ErrorKind::CropOutOfBounds => "CropOutOfBounds",
            ErrorKind::ScaleTooSmall => "ScaleTooSmall",
            ErrorKind::CorruptInput => "CorruptInput",
            ErrorKind::CodecError => "CodecError",
            ErrorKind::AllocationFailure => "AllocationFailure",
        }
    }
}

/// jpeg-pipeline error types
///
/// Every variant owns its payload, so errors can be cloned out of an async
/// task and re-raised on the JS thread.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    // Option Errors
    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidArgument {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    #[error("Invalid pixel format: {code}")]
    InvalidFormat { code: i64 },

    // Buffer Errors
    #[error("{buffer} buffer too small: {required} bytes required, {actual} supplied")]
    BufferTooSmall {
        buffer: Cow<'static, str>,
        required: usize,
        actual: usize,
    },

    #[error("Failed to allocate {bytes} bytes")]
    AllocationFailure { bytes: usize },

    // Planning Errors
    #[error("Crop: {axis} out of bounds ({offset} >= {extent})")]
    CropOutOfBounds {
        axis: Cow<'static, str>,
        offset: u32,
        extent: u32,
    },

    #[error("Scaling {axis} too small: {requested} (minimum {minimum})")]
    ScaleTooSmall {
        axis: Cow<'static, str>,
        requested: i64,
        minimum: u32,
    },

    // Size Limit Errors
    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("Image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    // Codec Errors
    #[error("Corrupt JPEG input: {message}")]
    CorruptInput { message: Cow<'static, str> },

    #[error("{operation} failed: {message}")]
    Codec {
        operation: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    // Internal Errors
    #[error("Internal error: {message}")]
    InternalPanic { message: Cow<'static, str> },
}

// Constructor Helpers
impl PipelineError {
    pub fn invalid_argument(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_format(code: i64) -> Self {
        Self::InvalidFormat { code }
    }

    pub fn buffer_too_small(
        buffer: impl Into<Cow<'static, str>>,
        required: usize,
        actual: usize,
    ) -> Self {
        Self::BufferTooSmall {
            buffer: buffer.into(),
            required,
            actual,
        }
    }

    pub fn allocation_failure(bytes: usize) -> Self {
        Self::AllocationFailure { bytes }
    }

    pub fn crop_out_of_bounds(axis: impl Into<Cow<'static, str>>, offset: u32, extent: u32) -> Self {
        Self::CropOutOfBounds {
            axis: axis.into(),
            offset,
            extent,
        }
    }

    pub fn scale_too_small(axis: impl Into<Cow<'static, str>>, requested: i64, minimum: u32) -> Self {
        Self::ScaleTooSmall {
            axis: axis.into(),
            requested,
            minimum,
        }
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn corrupt_input(message: impl Into<Cow<'static, str>>) -> Self {
        Self::CorruptInput {
            message: message.into(),
        }
    }

    pub fn codec(
        operation: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::Codec {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn internal_panic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalPanic {
            message: message.into(),
        }
    }

    /// The contract-level kind of this error.
    ///
    /// Dimension limits surface as `AllocationFailure`: the pipeline refuses
    /// to allocate for a header it will not decode. A caught panic surfaces
    /// as `CodecError` since it can only originate inside a codec call.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            Self::CropOutOfBounds { .. } => ErrorKind::CropOutOfBounds,
            Self::ScaleTooSmall { .. } => ErrorKind::ScaleTooSmall,
            Self::CorruptInput { .. } => ErrorKind::CorruptInput,
            Self::Codec { .. } | Self::InternalPanic { .. } => ErrorKind::CodecError,
            Self::AllocationFailure { .. }
            | Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. } => ErrorKind::AllocationFailure,
        }
    }

    /// Check if this error is recoverable (user can fix it)
    ///
    /// This method is consistent with category():
    /// - UserError errors are always recoverable
    /// - ResourceLimit errors are recoverable (smaller image, free memory)
    /// - CodecError and InternalBug errors are not recoverable
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::UserError | ErrorCategory::ResourceLimit => true,
            ErrorCategory::CodecError | ErrorCategory::InternalBug => false,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. }
            | Self::InvalidFormat { .. }
            | Self::BufferTooSmall { .. }
            | Self::CropOutOfBounds { .. }
            | Self::ScaleTooSmall { .. } => ErrorCategory::UserError,

            Self::CorruptInput { .. } | Self::Codec { .. } => ErrorCategory::CodecError,

            Self::AllocationFailure { .. }
            | Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. } => ErrorCategory::ResourceLimit,

            Self::InternalPanic { .. } => ErrorCategory::InternalBug,
        }
    }
}

#[cfg(feature = "napi")]
fn napi_status(category: &ErrorCategory) -> Status {
    match category {
        ErrorCategory::UserError | ErrorCategory::CodecError => Status::InvalidArg,
        ErrorCategory::ResourceLimit | ErrorCategory::InternalBug => Status::GenericFailure,
    }
}

/// Build a JS error object carrying `code`, `kind` and `category`.
/// JavaScript callers branch on `error.code` (e.g. "JPEG_PIPELINE_USER_ERROR")
/// or the finer `error.kind` (e.g. "BufferTooSmall").
#[cfg(feature = "napi")]
pub fn create_napi_error_with_code(
    env: &Env,
    err: PipelineError,
) -> napi::Result<napi::JsObject> {
    let category = err.category();
    let err_msg = err.to_string();
    let mut error_obj = env.create_error(napi::Error::new(napi_status(&category), err_msg.clone()))?;

    // napi::Error::new() may prefix the status; keep the message clean
    error_obj.set_named_property("message", env.create_string(&err_msg)?)?;
    error_obj.set_named_property("code", env.create_string(category.code())?)?;
    error_obj.set_named_property("kind", env.create_string(err.kind().as_str())?)?;
    error_obj.set_named_property("category", env.create_uint32(category as u32)?)?;

    Ok(error_obj)
}

/// Convert a PipelineError into a napi::Error that references the structured JS error.
#[cfg(feature = "napi")]
pub fn napi_error_with_code(env: &Env, err: PipelineError) -> napi::Result<napi::Error> {
    let error_obj = create_napi_error_with_code(env, err)?;
    Ok(napi::Error::from(error_obj.into_unknown()))
}

// Fallback conversion for paths without an Env (no code/kind properties).
#[cfg(feature = "napi")]
impl From<PipelineError> for napi::Error {
    fn from(err: PipelineError) -> Self {
        napi::Error::new(napi_status(&err.category()), err.to_string())
    }
}

#[cfg(feature = "napi")]
impl ErrorCategory {
    /// Get string representation of error category
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "UserError",
            ErrorCategory::CodecError => "CodecError",
            ErrorCategory::ResourceLimit => "ResourceLimit",
            ErrorCategory::InternalBug => "InternalBug",
        }
    }

    /// Get the JPEG_PIPELINE_* error code string for this category
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "JPEG_PIPELINE_USER_ERROR",
            ErrorCategory::CodecError => "JPEG_PIPELINE_CODEC_ERROR",
            ErrorCategory::ResourceLimit => "JPEG_PIPELINE_RESOURCE_LIMIT",
            ErrorCategory::InternalBug => "JPEG_PIPELINE_INTERNAL_BUG",
        }
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, PipelineError>;
