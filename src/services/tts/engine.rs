use std::path::Path;
use std::process::{Output, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use crate::voice::VoiceInfo;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{engine} binary not found")]
    MissingBinary { engine: &'static str },

    #[error("failed to launch {engine}: {source}")]
    Spawn {
        engine: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{engine} exited with {status}: {stderr}")]
    Failed {
        engine: &'static str,
        status: String,
        stderr: String,
    },

    #[error("voice error: {0}")]
    Voice(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Map a finished process to `Ok` or a `Failed` carrying its stderr.
    pub(crate) fn check(engine: &'static str, output: &Output) -> Result<(), EngineError> {
        if output.status.success() {
            return Ok(());
        }
        Err(EngineError::Failed {
            engine,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run `cmd` to completion with `text` on stdin. The child is killed if the
/// returned future is dropped (e.g. by a timeout).
pub(crate) async fn run_with_stdin(
    engine: &'static str,
    mut cmd: Command,
    text: &str,
) -> Result<(), EngineError> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(engine, command = ?cmd, "Running synthesis command");
    let mut child = cmd
        .spawn()
        .map_err(|source| EngineError::Spawn { engine, source })?;
    let written = match child.stdin.take() {
        Some(mut stdin) => {
            let result = stdin.write_all(text.as_bytes()).await;
            // Closing stdin signals end of input.
            drop(stdin);
            result
        }
        None => Ok(()),
    };
    // An engine that exits early breaks the pipe; its stderr says why.
    let output = child.wait_with_output().await?;
    EngineError::check(engine, &output)?;
    written.map_err(EngineError::from)
}

/// Run `cmd` and capture stdout, for catalog listings.
pub(crate) async fn capture_stdout(
    engine: &'static str,
    mut cmd: Command,
) -> Result<String, EngineError> {
    let output = cmd
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| EngineError::Spawn { engine, source })?;
    EngineError::check(engine, &output)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Base engine properties applied to every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisSettings {
    /// Words per minute.
    pub rate_wpm: u32,
    pub volume: f32,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            rate_wpm: 160,
            volume: 1.0,
        }
    }
}

/// The synthesis capability.
///
/// `synthesize` only has to *issue* the request: completion is observed by the
/// caller through the filesystem, so fire-and-forget backends are as valid as
/// blocking ones.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extension (without dot) of the artifacts this engine writes.
    fn artifact_extension(&self) -> &'static str;

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, EngineError>;

    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        destination: &Path,
    ) -> Result<(), EngineError>;
}

/// Exclusive-access wrapper around an engine. Holding the lock for the full
/// request keeps engine state (current voice, output queue) single-owner.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<Box<dyn SpeechEngine>>>,
    name: &'static str,
    extension: &'static str,
}

impl EngineHandle {
    pub fn new(engine: Box<dyn SpeechEngine>) -> Self {
        let name = engine.name();
        let extension = engine.artifact_extension();
        Self {
            inner: Arc::new(Mutex::new(engine)),
            name,
            extension,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn artifact_extension(&self) -> &'static str {
        self.extension
    }

    pub async fn list_voices(&self) -> Result<Vec<VoiceInfo>, EngineError> {
        self.inner.lock().await.list_voices().await
    }

    pub async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        destination: &Path,
    ) -> Result<(), EngineError> {
        let engine = self.inner.lock().await;
        engine.synthesize(text, voice_id, destination).await
    }
}
