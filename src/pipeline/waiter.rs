use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Ready { bytes: u64 },
    Empty,
}

#[derive(Error, Debug)]
pub enum WaitError {
    #[error("artifact {} did not appear in time", .0.display())]
    Timeout(PathBuf),

    #[error("cannot inspect {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Polls the filesystem for an artifact written by a backend that gives no
/// completion signal of its own.
#[derive(Debug, Clone, Copy)]
pub struct CompletionWaiter {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl CompletionWaiter {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub async fn wait(&self, path: &Path) -> Result<ArtifactStatus, WaitError> {
        self.wait_until(path, Instant::now() + self.timeout).await
    }

    /// Wait until `path` exists or `deadline` passes. Existence is checked
    /// once more at the deadline, so an artifact landing in the final
    /// interval still counts.
    pub async fn wait_until(
        &self,
        path: &Path,
        deadline: Instant,
    ) -> Result<ArtifactStatus, WaitError> {
        let mut polls: u32 = 0;
        loop {
            match tokio::fs::metadata(path).await {
                Ok(meta) => {
                    debug!(path = ?path, bytes = meta.len(), polls, "Artifact present");
                    return Ok(match meta.len() {
                        0 => ArtifactStatus::Empty,
                        bytes => ArtifactStatus::Ready { bytes },
                    });
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(WaitError::Io {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(WaitError::Timeout(path.to_path_buf()));
            }
            polls += 1;
            sleep_until((now + self.poll_interval).min(deadline)).await;
        }
    }
}

impl Default for CompletionWaiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), DEFAULT_POLL_INTERVAL)
    }
}
