use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::engine::{capture_stdout, run_with_stdin, EngineError, SpeechEngine, SynthesisSettings};
use crate::voice::VoiceInfo;

const ENGINE: &str = "say";

/// macOS `say`. Writes AIFF; the catalog carries no gender, so selection
/// relies on overrides or the first/last fallback.
pub struct SayEngine {
    bin: PathBuf,
    settings: SynthesisSettings,
}

impl SayEngine {
    pub fn new(bin: PathBuf, settings: SynthesisSettings) -> Self {
        if (settings.volume - 1.0).abs() > f32::EPSILON {
            debug!(volume = settings.volume, "say has no volume flag; ignoring");
        }
        Self { bin, settings }
    }
}

#[async_trait]
impl SpeechEngine for SayEngine {
    fn name(&self) -> &'static str {
        ENGINE
    }

    fn artifact_extension(&self) -> &'static str {
        "aiff"
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, EngineError> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("-v").arg("?");
        let listing = capture_stdout(ENGINE, cmd).await?;
        Ok(parse_voice_listing(&listing))
    }

    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        destination: &Path,
    ) -> Result<(), EngineError> {
        let mut cmd = Command::new(&self.bin);
        if !voice_id.is_empty() {
            cmd.arg("-v").arg(voice_id);
        }
        cmd.arg("-r").arg(self.settings.rate_wpm.to_string());
        cmd.arg("-o").arg(destination);
        cmd.arg("-f").arg("-");
        run_with_stdin(ENGINE, cmd, text).await
    }
}

/// Parse `say -v '?'`, e.g. `Eddy (English (US))  en_US    # Hello! My name is Eddy.`
pub fn parse_voice_listing(listing: &str) -> Vec<VoiceInfo> {
    listing
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim_end();
            let (name, locale) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() || !locale.contains('_') {
                return None;
            }
            Some(VoiceInfo {
                id: name.to_string(),
                name: name.to_string(),
                locale_tags: vec![locale.to_string()],
                gender: None,
            })
        })
        .collect()
}
