//! Process execution
//!
//! - `runner`: shell command execution, streaming, cancellation, reports
//! - `decoder`: incremental UTF-8 decoding of process output

mod decoder;
mod runner;

pub use decoder::Utf8Decoder;
pub use runner::{
    CancelHandle, ChunkSink, ExecutionReport, ExecutionStatus, OutputChunk, OutputStream,
    ProcessRunner, NO_OUTPUT,
};
