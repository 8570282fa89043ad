use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::{PipelineError, Result};

pub const MANIFEST_NAME: &str = "concat_list.txt";

/// Per-run scratch directory holding line artifacts and the concat manifest.
///
/// `cleanup` removes everything best-effort and never fails. If the guard is
/// dropped without `cleanup` having run, `Drop` removes the directory tree.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    artifacts: Vec<PathBuf>,
    cleaned: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub failures: usize,
}

impl ScratchDir {
    /// Create `<output_dir>/.lines_<run_id>`. The returned path is absolute,
    /// so manifest entries resolve regardless of the tool's working directory.
    pub async fn create(output_dir: &Path, run_id: &Uuid) -> Result<Self> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| PipelineError::io(output_dir, e))?;
        let output_dir = tokio::fs::canonicalize(output_dir)
            .await
            .map_err(|e| PipelineError::io(output_dir, e))?;

        let path = output_dir.join(format!(".lines_{}", run_id.simple()));
        tokio::fs::create_dir(&path)
            .await
            .map_err(|e| PipelineError::io(&path, e))?;
        debug!(path = ?path, "Scratch directory created");

        Ok(Self {
            path,
            artifacts: Vec::new(),
            cleaned: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_NAME)
    }

    /// Register an artifact for removal, whether or not it is ever written.
    pub fn track(&mut self, artifact: PathBuf) {
        self.artifacts.push(artifact);
    }

    /// Remove tracked artifacts, the manifest, then the directory. Each
    /// removal is independent; already-missing files are not failures.
    pub async fn cleanup(mut self) -> CleanupReport {
        let mut report = CleanupReport::default();

        let files = std::mem::take(&mut self.artifacts)
            .into_iter()
            .chain(std::iter::once(self.manifest_path()));
        for file in files {
            match tokio::fs::remove_file(&file).await {
                Ok(()) => report.removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    debug!(path = ?file, error = %e, "Failed to remove scratch file");
                    report.failures += 1;
                }
            }
        }

        // Anything untracked (late writes from a detached backend) goes too.
        if let Err(e) = tokio::fs::remove_dir(&self.path).await {
            if e.kind() != ErrorKind::NotFound {
                if let Err(e) = tokio::fs::remove_dir_all(&self.path).await {
                    debug!(path = ?self.path, error = %e, "Failed to remove scratch directory");
                    report.failures += 1;
                }
            }
        }

        self.cleaned = true;
        report
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if !self.cleaned {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
