use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use crate::error::{PipelineError, Result};
use crate::services::concat::{Concatenator, OutputFormat};

pub const OUTPUT_PREFIX: &str = "combined_conversation";

/// Joins ready segments into the combined artifact.
///
/// The tool writes to a hidden `.partial` file next to the final path; only a
/// successful, non-empty result is renamed into place.
pub struct Assembler {
    concatenator: Arc<dyn Concatenator>,
    output_dir: PathBuf,
    format: OutputFormat,
}

impl Assembler {
    pub fn new(
        concatenator: Arc<dyn Concatenator>,
        output_dir: impl Into<PathBuf>,
        format: OutputFormat,
    ) -> Self {
        Self {
            concatenator,
            output_dir: output_dir.into(),
            format,
        }
    }

    /// `segments` must already be in line order.
    pub async fn assemble(
        &self,
        segments: &[PathBuf],
        manifest: &Path,
        stamp: &str,
    ) -> Result<PathBuf> {
        if segments.is_empty() {
            return Err(PipelineError::NoSegments);
        }

        self.concatenator
            .probe()
            .await
            .map_err(|e| PipelineError::Assembly(e.to_string()))?;

        tokio::fs::write(manifest, render_manifest(segments))
            .await
            .map_err(|e| PipelineError::io(manifest, e))?;

        let output = self.reserve_output_path(stamp).await?;
        let partial = partial_path(&output);

        info!(segments = segments.len(), tool = self.concatenator.name(), "Combining audio segments");
        let joined = self
            .concatenator
            .concatenate(manifest, &partial, &self.format)
            .await;

        if let Err(e) = joined {
            discard(&partial).await;
            discard(&output).await;
            error!(error = %e, "Concatenation failed");
            return Err(PipelineError::Assembly(e.to_string()));
        }

        match tokio::fs::metadata(&partial).await {
            Ok(meta) if meta.len() > 0 => {}
            _ => {
                discard(&partial).await;
                discard(&output).await;
                return Err(PipelineError::Assembly(format!(
                    "{} reported success but produced no output",
                    self.concatenator.name()
                )));
            }
        }

        // Replaces the empty placeholder claimed by `reserve_output_path`.
        if let Err(e) = tokio::fs::rename(&partial, &output).await {
            discard(&partial).await;
            discard(&output).await;
            return Err(PipelineError::io(&output, e));
        }
        Ok(output)
    }

    /// Claim `combined_conversation_<stamp>.<ext>` by creating it empty, with
    /// `_2`, `_3`, ... appended when another run already holds the name.
    async fn reserve_output_path(&self, stamp: &str) -> Result<PathBuf> {
        let ext = &self.format.extension;
        let mut candidate = self
            .output_dir
            .join(format!("{}_{}.{}", OUTPUT_PREFIX, stamp, ext));
        let mut n = 2;
        loop {
            let claimed = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await;
            match claimed {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    candidate = self
                        .output_dir
                        .join(format!("{}_{}_{}.{}", OUTPUT_PREFIX, stamp, n, ext));
                    n += 1;
                }
                Err(e) => return Err(PipelineError::io(&candidate, e)),
            }
        }
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{}.partial", name))
}

async fn discard(path: &Path) {
    let _ = tokio::fs::remove_file(path).await;
}

/// ffmpeg concat-demuxer manifest: one `file '<path>'` per line, forward
/// slashes, single quotes escaped as `'\''`.
pub fn render_manifest(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|p| {
            let path = p.to_string_lossy().replace('\\', "/").replace('\'', r"'\''");
            format!("file '{}'\n", path)
        })
        .collect()
}
