// src/engine/common.rs
//
// Shared helpers for code that calls into libjpeg-turbo.

use crate::error::{PipelineError, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run a codec call, turning a panic into `InternalPanic` instead of unwinding
/// across the Node.js boundary. `label` names the call site, e.g. "decode:jpeg".
pub fn run_with_panic_policy<T, F>(label: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            tracing::error!(target: "jpeg_pipeline::codec", label, %detail, "codec call panicked");
            Err(PipelineError::internal_panic(format!("{label}: {detail}")))
        }
    }
}
