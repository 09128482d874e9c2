//! Conditions that halt the pipeline on purpose.
//!
//! Everything else (missing inputs, transport faults, malformed JSON) is an
//! ordinary `anyhow` error with context attached where it happens.

use thiserror::Error;

/// A deliberate abort. Later stages do not run and write nothing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Response is empty")]
    EmptyResponse,

    #[error("Unable to proceed due to server errors ({0} reported)")]
    ServerErrors(usize),

    #[error("Unable to proceed due to errors ({0} reported)")]
    CompileErrors(usize),

    #[error("Response has no compiledCode field")]
    MissingCompiledCode,

    #[error("{program} exited with {status}")]
    ArchiverFailed { program: String, status: String },
}
