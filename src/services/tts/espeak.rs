use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use super::engine::{capture_stdout, run_with_stdin, EngineError, SpeechEngine, SynthesisSettings};
use crate::voice::{Gender, VoiceInfo};

const ENGINE: &str = "espeak-ng";

pub struct EspeakEngine {
    bin: PathBuf,
    settings: SynthesisSettings,
}

impl EspeakEngine {
    pub fn new(bin: PathBuf, settings: SynthesisSettings) -> Self {
        Self { bin, settings }
    }
}

#[async_trait]
impl SpeechEngine for EspeakEngine {
    fn name(&self) -> &'static str {
        ENGINE
    }

    fn artifact_extension(&self) -> &'static str {
        "wav"
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, EngineError> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--voices");
        let listing = capture_stdout(ENGINE, cmd).await?;
        Ok(parse_voice_listing(&listing))
    }

    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        destination: &Path,
    ) -> Result<(), EngineError> {
        let wpm = self.settings.rate_wpm.clamp(80, 450);
        let amplitude = (100.0 * self.settings.volume).round().clamp(0.0, 200.0) as u32;

        let mut cmd = Command::new(&self.bin);
        if !voice_id.is_empty() {
            cmd.arg("-v").arg(voice_id);
        }
        cmd.arg("-s").arg(wpm.to_string());
        cmd.arg("-a").arg(amplitude.to_string());
        cmd.arg("-w").arg(destination);
        cmd.arg("--stdin");
        run_with_stdin(ENGINE, cmd, text).await
    }
}

/// Parse `espeak-ng --voices`:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  2  en-gb           --/M      English_(Great_Britain) gmw/en          (en 2)
/// ```
///
/// The language code doubles as the voice id, since `-v` accepts it.
pub fn parse_voice_listing(listing: &str) -> Vec<VoiceInfo> {
    listing
        .lines()
        .skip_while(|line| line.trim_start().starts_with("Pty"))
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 5 {
                return None;
            }
            let language = cols[1];
            let gender = cols[2].rsplit('/').next().and_then(Gender::parse);
            Some(VoiceInfo {
                id: language.to_string(),
                name: cols[3].replace('_', " "),
                locale_tags: vec![language.to_string()],
                gender,
            })
        })
        .collect()
}
