use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use super::engine::{run_with_stdin, EngineError, SpeechEngine, SynthesisSettings};
use crate::voice::VoiceInfo;

const ENGINE: &str = "piper";

/// Piper reads text on stdin and writes WAV. Voices are the `.onnx` models
/// found in `voice_dir`; the model path is the voice id.
pub struct PiperEngine {
    bin: PathBuf,
    voice_dir: PathBuf,
    settings: SynthesisSettings,
}

impl PiperEngine {
    pub fn new(bin: PathBuf, voice_dir: PathBuf, settings: SynthesisSettings) -> Self {
        Self {
            bin,
            voice_dir,
            settings,
        }
    }
}

#[async_trait]
impl SpeechEngine for PiperEngine {
    fn name(&self) -> &'static str {
        ENGINE
    }

    fn artifact_extension(&self) -> &'static str {
        "wav"
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, EngineError> {
        let mut models = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.voice_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "onnx") {
                models.push(path);
            }
        }
        // read_dir order is platform-defined
        models.sort();
        Ok(models.iter().filter_map(|p| voice_from_model(p)).collect())
    }

    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        destination: &Path,
    ) -> Result<(), EngineError> {
        if voice_id.is_empty() {
            return Err(EngineError::Voice("piper needs a model path".into()));
        }
        // Piper's speed knob is inverse: 160 wpm is its 1.0 baseline.
        let length_scale = (160.0 / self.settings.rate_wpm.max(1) as f32).clamp(0.5, 2.0);

        let mut cmd = Command::new(&self.bin);
        cmd.arg("-m").arg(voice_id);
        cmd.arg("-f").arg(destination);
        cmd.arg("--length_scale").arg(format!("{:.2}", length_scale));
        run_with_stdin(ENGINE, cmd, text).await
    }
}

/// `en_US-amy-medium.onnx` -> name `en_US-amy-medium`, locale `en_US`.
fn voice_from_model(path: &Path) -> Option<VoiceInfo> {
    let stem = path.file_stem()?.to_str()?;
    let locale = stem.split('-').next().unwrap_or(stem);
    Some(VoiceInfo {
        id: path.to_string_lossy().into_owned(),
        name: stem.to_string(),
        locale_tags: vec![locale.to_string()],
        gender: None,
    })
}
