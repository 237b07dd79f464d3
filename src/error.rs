//! Error types for the rendering pipeline
//!
//! Configuration problems surface from `init`, sink failures from `finish`.
//! Nothing in the library recovers from these; they go straight back to the caller.

use thiserror::Error;

/// Errors that can occur while rendering an APU sample stream
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Decimation ratio {ratio} does not give a positive integer period")]
    InvalidPeriod { ratio: f64 },

    #[error("Invalid filter specification: {0}")]
    InvalidFilterSpec(String),

    #[error("Output sink error: {0}")]
    SinkIo(#[from] hound::Error),

    #[error("`{op}` called while the consumer is {state}")]
    Lifecycle {
        op: &'static str,
        state: &'static str,
    },

    #[error("Capture I/O error: {0}")]
    CaptureIo(#[from] std::io::Error),

    #[error("Capture ends with a partial sample at byte offset {offset}")]
    TruncatedCapture { offset: u64 },
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, RenderError>;
