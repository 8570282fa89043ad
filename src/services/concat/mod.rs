//! Audio concatenation capability and its ffmpeg backend.

pub mod ffmpeg;

pub use ffmpeg::FfmpegConcatenator;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConcatError {
    #[error("{tool} not available: {hint}")]
    Unavailable { tool: String, hint: String },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fixed output encoding for the combined artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFormat {
    pub codec: String,
    pub quality: String,
    /// Container name passed to the tool (`mp3`).
    pub container: String,
    /// File extension of the combined artifact, without dot.
    pub extension: String,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            codec: "libmp3lame".to_string(),
            quality: "2".to_string(),
            container: "mp3".to_string(),
            extension: "mp3".to_string(),
        }
    }
}

/// The concatenation capability: join the files listed in `manifest`, in
/// order and without gaps, into `output`.
#[async_trait]
pub trait Concatenator: Send + Sync {
    fn name(&self) -> &str;

    /// Check the tool can run at all, before any assembly is attempted.
    async fn probe(&self) -> Result<(), ConcatError>;

    async fn concatenate(
        &self,
        manifest: &Path,
        output: &Path,
        format: &OutputFormat,
    ) -> Result<(), ConcatError>;
}
