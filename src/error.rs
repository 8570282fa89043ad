use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal pipeline failures. Every variant names the stage (and line, where one
/// exists) that failed.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("transcript is empty")]
    EmptyTranscript,

    #[error("no voices available from the synthesis engine")]
    NoVoicesAvailable,

    #[error("voice catalog unavailable: {0}")]
    Catalog(String),

    #[error("line {line_index}: synthesis failed: {message}")]
    Synthesis { line_index: usize, message: String },

    #[error("line {line_index}: timed out after {}ms waiting for {}", .timeout.as_millis(), .path.display())]
    Timeout {
        line_index: usize,
        path: PathBuf,
        timeout: Duration,
    },

    #[error("no usable segments were synthesized")]
    NoSegments,

    #[error("assembly failed: {0}")]
    Assembly(String),

    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Non-fatal conditions recovered inside the run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum PipelineWarning {
    /// The engine produced a zero-byte artifact; the line is left out of the
    /// combined file.
    EmptySegment { line_index: usize, path: PathBuf },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
