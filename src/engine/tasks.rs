// src/engine/tasks.rs
//
// Deferred (promise-returning) variants of the host operations.
// Each task owns a copy of its input and holds the caller's destination, if
// any, for the lifetime of the call. The work runs on the libuv worker pool
// through the same `api::run` the synchronous exports use.

use crate::codecs::JpegHeader;
use crate::engine::api::{
    self, DecodeResult, EncodeResult, Finished, HeaderResult, Operation, RawResult,
};
use crate::error::{napi_error_with_code, PipelineError};
use crate::ops::{Defaults, Options};
use napi::bindgen_prelude::*;
use napi::{Env, Task};

/// Input and settings of one deferred call, shared by every task type.
pub(crate) struct Job {
    operation: Operation,
    input: Vec<u8>,
    out: Option<Buffer>,
    options: Options,
    defaults: Defaults,
    last_error: Option<PipelineError>,
}

impl Job {
    fn new(operation: Operation, input: &[u8], out: Option<Buffer>, options: Option<Options>) -> Self {
        Self {
            operation,
            input: input.to_vec(),
            out,
            options: options.unwrap_or_default(),
            defaults: Defaults::default(),
            last_error: None,
        }
    }

    fn run(&mut self) -> crate::error::Result<Finished> {
        api::run(
            self.operation,
            &self.input,
            self.out.as_deref_mut(),
            &self.options,
            &self.defaults,
        )
    }

    fn compute(&mut self) -> Result<Finished> {
        match self.run() {
            Ok(result) => {
                self.last_error = None;
                Ok(result)
            }
            Err(err) => {
                // Store the error for use in reject
                self.last_error = Some(err.clone());
                Err(napi::Error::from(err))
            }
        }
    }

    fn reject<T>(&mut self, env: Env, err: napi::Error) -> Result<T> {
        let pipeline_err = take_error(&mut self.last_error, &err);
        Err(napi_error_with_code(&env, pipeline_err)?)
    }
}

// Every compute() failure stores its error; the fallback covers napi-side failures.
fn take_error(last_error: &mut Option<PipelineError>, err: &napi::Error) -> PipelineError {
    last_error
        .take()
        .unwrap_or_else(|| PipelineError::codec("task", err.to_string()))
}

pub struct DecompressTask {
    pub(crate) job: Job,
}

impl Task for DecompressTask {
    type Output = Finished;
    type JsValue = DecodeResult;

    fn compute(&mut self) -> Result<Self::Output> {
        self.job.compute()
    }

    fn resolve(&mut self, _env: Env, output: Self::Output) -> Result<Self::JsValue> {
        output.into_decode_result(self.job.out.take())
    }

    fn reject(&mut self, env: Env, err: napi::Error) -> Result<Self::JsValue> {
        self.job.reject(env, err)
    }
}

pub struct CompressTask {
    pub(crate) job: Job,
}

impl Task for CompressTask {
    type Output = Finished;
    type JsValue = EncodeResult;

    fn compute(&mut self) -> Result<Self::Output> {
        self.job.compute()
    }

    fn resolve(&mut self, _env: Env, output: Self::Output) -> Result<Self::JsValue> {
        output.into_encode_result(self.job.out.take())
    }

    fn reject(&mut self, env: Env, err: napi::Error) -> Result<Self::JsValue> {
        self.job.reject(env, err)
    }
}

/// Crop or scale of raw pixels.
pub struct RawTask {
    pub(crate) job: Job,
}

impl Task for RawTask {
    type Output = Finished;
    type JsValue = RawResult;

    fn compute(&mut self) -> Result<Self::Output> {
        self.job.compute()
    }

    fn resolve(&mut self, _env: Env, output: Self::Output) -> Result<Self::JsValue> {
        output.into_raw_result(self.job.out.take())
    }

    fn reject(&mut self, env: Env, err: napi::Error) -> Result<Self::JsValue> {
        self.job.reject(env, err)
    }
}

pub struct HeaderTask {
    pub(crate) input: Vec<u8>,
    pub(crate) last_error: Option<PipelineError>,
}

impl Task for HeaderTask {
    type Output = JpegHeader;
    type JsValue = HeaderResult;

    fn compute(&mut self) -> Result<Self::Output> {
        api::header(&self.input).map_err(|err| {
            self.last_error = Some(err.clone());
            napi::Error::from(err)
        })
    }

    fn resolve(&mut self, _env: Env, header: Self::Output) -> Result<Self::JsValue> {
        Ok(HeaderResult {
            width: header.width,
            height: header.height,
            subsampling: header.subsampling.code(),
        })
    }

    fn reject(&mut self, env: Env, err: napi::Error) -> Result<Self::JsValue> {
        let pipeline_err = take_error(&mut self.last_error, &err);
        Err(napi_error_with_code(&env, pipeline_err)?)
    }
}

#[napi(ts_return_type = "Promise<DecodeResult>")]
pub fn decompress(
    input: Buffer,
    out: Option<Buffer>,
    options: Option<Options>,
) -> AsyncTask<DecompressTask> {
    AsyncTask::new(DecompressTask {
        job: Job::new(Operation::Decompress, &input, out, options),
    })
}

#[napi(ts_return_type = "Promise<EncodeResult>")]
pub fn compress(
    input: Buffer,
    out: Option<Buffer>,
    options: Option<Options>,
) -> AsyncTask<CompressTask> {
    AsyncTask::new(CompressTask {
        job: Job::new(Operation::Compress, &input, out, options),
    })
}

#[napi(ts_return_type = "Promise<RawResult>")]
pub fn crop(
    input: Buffer,
    out: Option<Buffer>,
    options: Option<Options>,
) -> AsyncTask<RawTask> {
    AsyncTask::new(RawTask {
        job: Job::new(Operation::Crop, &input, out, options),
    })
}

#[napi(ts_return_type = "Promise<RawResult>")]
pub fn scale(
    input: Buffer,
    out: Option<Buffer>,
    options: Option<Options>,
) -> AsyncTask<RawTask> {
    AsyncTask::new(RawTask {
        job: Job::new(Operation::Scale, &input, out, options),
    })
}

#[napi(ts_return_type = "Promise<HeaderResult>")]
pub fn header(input: Buffer) -> AsyncTask<HeaderTask> {
    AsyncTask::new(HeaderTask {
        input: input.to_vec(),
        last_error: None,
    })
}
