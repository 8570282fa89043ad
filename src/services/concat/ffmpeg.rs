use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::{ConcatError, Concatenator, OutputFormat};

const INSTALL_HINT: &str =
    "install ffmpeg and make sure it is on PATH, or point FFMPEG_BIN at the binary";

/// ffmpeg concat demuxer. Inputs are re-encoded once with the fixed codec,
/// so segments in any engine format join into one stream.
pub struct FfmpegConcatenator {
    bin: PathBuf,
}

impl FfmpegConcatenator {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    fn tool(&self) -> String {
        self.bin.display().to_string()
    }
}

#[async_trait]
impl Concatenator for FfmpegConcatenator {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self) -> Result<(), ConcatError> {
        let status = Command::new(&self.bin)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await;

        match status {
            Ok(s) if s.success() => {
                info!(bin = ?self.bin, "ffmpeg found");
                Ok(())
            }
            _ => Err(ConcatError::Unavailable {
                tool: self.tool(),
                hint: INSTALL_HINT.to_string(),
            }),
        }
    }

    async fn concatenate(
        &self,
        manifest: &Path,
        output: &Path,
        format: &OutputFormat,
    ) -> Result<(), ConcatError> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(manifest)
            .args(["-c:a", format.codec.as_str(), "-q:a", format.quality.as_str()])
            .args(["-f", format.container.as_str()])
            .arg(output)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(command = ?cmd, "Running ffmpeg concat");
        let out = cmd.output().await.map_err(|_| ConcatError::Unavailable {
            tool: self.tool(),
            hint: INSTALL_HINT.to_string(),
        })?;

        if !out.status.success() {
            return Err(ConcatError::Failed {
                tool: self.tool(),
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
