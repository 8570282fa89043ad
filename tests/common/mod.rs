#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use parley::services::concat::{ConcatError, Concatenator, OutputFormat};
use parley::services::tts::{EngineError, EngineHandle, SpeechEngine};
use parley::voice::{Gender, VoiceInfo};
use parley::PipelineOptions;

/// What the stub engine does for one request.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Write the text as the artifact body before returning.
    Write,
    /// Return at once and write the artifact after a delay.
    WriteLater(Duration),
    /// Write a one-second WAV instead of the text.
    OneSecondWav,
    /// Create a zero-byte artifact.
    Empty,
    /// Accept the request and never write anything.
    Never,
    /// Never return from the request.
    Hang,
    /// Report an engine failure.
    Fail,
}

pub type Rule = Arc<dyn Fn(&str) -> Behavior + Send + Sync>;

/// Deterministic in-process engine. The artifact body is the utterance text,
/// so the combined file spells out the segment order.
pub struct StubEngine {
    voices: Vec<VoiceInfo>,
    rule: Rule,
    pub calls: Arc<Mutex<Vec<(String, PathBuf)>>>,
}

impl StubEngine {
    pub fn new(rule: impl Fn(&str) -> Behavior + Send + Sync + 'static) -> Self {
        Self {
            voices: catalog(),
            rule: Arc::new(rule),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn writing() -> Self {
        Self::new(|_| Behavior::Write)
    }

    pub fn with_voices(mut self, voices: Vec<VoiceInfo>) -> Self {
        self.voices = voices;
        self
    }

    pub fn into_handle(self) -> (EngineHandle, Arc<Mutex<Vec<(String, PathBuf)>>>) {
        let calls = Arc::clone(&self.calls);
        (EngineHandle::new(Box::new(self)), calls)
    }
}

#[async_trait]
impl SpeechEngine for StubEngine {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn artifact_extension(&self) -> &'static str {
        "wav"
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, EngineError> {
        Ok(self.voices.clone())
    }

    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        destination: &Path,
    ) -> Result<(), EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push((voice_id.to_string(), destination.to_path_buf()));

        match (self.rule)(text) {
            Behavior::Write => {
                tokio::fs::write(destination, text.as_bytes()).await?;
            }
            Behavior::WriteLater(delay) => {
                let destination = destination.to_path_buf();
                let body = text.as_bytes().to_vec();
                // Rename so the waiter never observes a half-written file.
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let staging = destination.with_extension("staging");
                    if tokio::fs::write(&staging, body).await.is_ok() {
                        let _ = tokio::fs::rename(&staging, &destination).await;
                    }
                });
            }
            Behavior::OneSecondWav => write_one_second_wav(destination),
            Behavior::Empty => {
                tokio::fs::write(destination, b"").await?;
            }
            Behavior::Never => {}
            Behavior::Hang => std::future::pending::<()>().await,
            Behavior::Fail => {
                return Err(EngineError::Failed {
                    engine: "stub",
                    status: "exit status: 1".into(),
                    stderr: "voice exploded".into(),
                });
            }
        }
        Ok(())
    }
}

pub fn voice(id: &str, locale: &str, gender: Option<Gender>) -> VoiceInfo {
    VoiceInfo {
        id: id.to_string(),
        name: id.to_string(),
        locale_tags: vec![locale.to_string()],
        gender,
    }
}

pub fn catalog() -> Vec<VoiceInfo> {
    vec![
        voice("fr-f", "fr_FR", Some(Gender::Female)),
        voice("en-f", "en_US", Some(Gender::Female)),
        voice("en-m", "en_GB", Some(Gender::Male)),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatMode {
    Join,
    /// Write some bytes to the output, then fail.
    FailAfterPartialWrite,
    /// Succeed without writing anything.
    SilentNoOutput,
    Unavailable,
}

/// Byte-level concatenator reading the same manifest ffmpeg would.
pub struct StubConcatenator {
    mode: ConcatMode,
    pub manifests: Arc<Mutex<Vec<Vec<PathBuf>>>>,
}

impl StubConcatenator {
    pub fn new(mode: ConcatMode) -> Self {
        Self {
            mode,
            manifests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn joining() -> Self {
        Self::new(ConcatMode::Join)
    }
}

#[async_trait]
impl Concatenator for StubConcatenator {
    fn name(&self) -> &str {
        "stub-concat"
    }

    async fn probe(&self) -> Result<(), ConcatError> {
        match self.mode {
            ConcatMode::Unavailable => Err(ConcatError::Unavailable {
                tool: "stub-concat".into(),
                hint: "not installed".into(),
            }),
            _ => Ok(()),
        }
    }

    async fn concatenate(
        &self,
        manifest: &Path,
        output: &Path,
        _format: &OutputFormat,
    ) -> Result<(), ConcatError> {
        let entries = read_manifest(manifest).await?;
        self.manifests.lock().unwrap().push(entries.clone());

        match self.mode {
            ConcatMode::Join => {
                let mut combined = Vec::new();
                for entry in &entries {
                    combined.extend(tokio::fs::read(entry).await?);
                    combined.push(b'|');
                }
                tokio::fs::write(output, combined).await?;
                Ok(())
            }
            ConcatMode::FailAfterPartialWrite => {
                tokio::fs::write(output, b"half").await?;
                Err(ConcatError::Failed {
                    tool: "stub-concat".into(),
                    status: "exit status: 1".into(),
                    stderr: "Invalid data found when processing input".into(),
                })
            }
            ConcatMode::SilentNoOutput => Ok(()),
            ConcatMode::Unavailable => unreachable!("probe fails first"),
        }
    }
}

pub async fn read_manifest(manifest: &Path) -> Result<Vec<PathBuf>, ConcatError> {
    let raw = tokio::fs::read_to_string(manifest).await?;
    Ok(raw
        .lines()
        .filter_map(|line| line.strip_prefix("file '")?.strip_suffix('\''))
        .map(|p| PathBuf::from(p.replace(r"'\''", "'")))
        .collect())
}

pub fn options(output_dir: &Path) -> PipelineOptions {
    PipelineOptions {
        output_dir: output_dir.to_path_buf(),
        timeout: Duration::from_millis(400),
        poll_interval: Duration::from_millis(10),
        ..PipelineOptions::default()
    }
}

/// Files in `dir` whose name starts with `prefix`, sorted.
pub fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(prefix))
                })
                .collect()
        })
        .unwrap_or_default();
    found.sort();
    found
}

/// Write a one-second 16 kHz mono WAV.
pub fn write_one_second_wav(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..16_000u32 {
        let sample = ((i as f32 * 0.05).sin() * 8000.0) as i16;
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}
