use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::services::concat::OutputFormat;
use crate::services::tts::SynthesisSettings;
use crate::voice::VoicePolicy;

pub const CONFIG_ENV: &str = "PARLEY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "parley.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    #[default]
    Auto,
    EspeakNg,
    Say,
    Piper,
}

impl std::str::FromStr for EngineKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(EngineKind::Auto),
            "espeak-ng" | "espeak" => Ok(EngineKind::EspeakNg),
            "say" => Ok(EngineKind::Say),
            "piper" => Ok(EngineKind::Piper),
            other => Err(ConfigError::Invalid(format!("unknown engine '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where combined artifacts land. Scratch directories are created inside it.
    pub output_dir: PathBuf,
    pub synthesis: SynthesisConfig,
    pub voices: VoicesConfig,
    pub assembly: AssemblyConfig,
    pub engines: EnginesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub engine: EngineKind,
    /// Per-line budget covering the request and the wait for its artifact.
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub rate_wpm: u32,
    pub volume: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoicesConfig {
    pub language: String,
    pub agent: Option<String>,
    pub member: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    pub ffmpeg_bin: PathBuf,
    pub codec: String,
    pub quality: String,
    pub container: String,
    pub extension: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginesConfig {
    pub espeak_bin: Option<PathBuf>,
    pub say_bin: Option<PathBuf>,
    pub piper_bin: Option<PathBuf>,
    pub piper_voice_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("conversation_audio"),
            synthesis: SynthesisConfig::default(),
            voices: VoicesConfig::default(),
            assembly: AssemblyConfig::default(),
            engines: EnginesConfig::default(),
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        let settings = SynthesisSettings::default();
        Self {
            engine: EngineKind::Auto,
            timeout_ms: 30_000,
            poll_interval_ms: 100,
            rate_wpm: settings.rate_wpm,
            volume: settings.volume,
        }
    }
}

impl Default for VoicesConfig {
    fn default() -> Self {
        Self {
            language: VoicePolicy::default().language,
            agent: None,
            member: None,
        }
    }
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        let format = OutputFormat::default();
        Self {
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            codec: format.codec,
            quality: format.quality,
            container: format.container,
            extension: format.extension,
        }
    }
}

impl AppConfig {
    /// Defaults -> TOML file -> environment. `explicit` must exist when given;
    /// otherwise `PARLEY_CONFIG` or `./parley.toml` are read if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .or_else(|| {
                    let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                    p.exists().then_some(p)
                }),
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                info!("No TOML config found; using defaults/env");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Overlay environment overrides, read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PARLEY_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("PARLEY_ENGINE") {
            self.synthesis.engine = v.parse()?;
        }
        if let Some(v) = lookup("PARLEY_TIMEOUT_MS") {
            self.synthesis.timeout_ms = parse_number("PARLEY_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("PARLEY_POLL_MS") {
            self.synthesis.poll_interval_ms = parse_number("PARLEY_POLL_MS", &v)?;
        }
        if let Some(v) = lookup("FFMPEG_BIN") {
            self.assembly.ffmpeg_bin = PathBuf::from(v);
        }
        if let Some(v) = lookup("ESPEAK_BIN") {
            self.engines.espeak_bin = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SAY_BIN") {
            self.engines.say_bin = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("PIPER_BIN") {
            self.engines.piper_bin = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("PIPER_VOICE_DIR") {
            self.engines.piper_voice_dir = Some(PathBuf::from(v));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.synthesis.timeout_ms == 0 {
            return Err(ConfigError::Invalid("synthesis.timeout_ms must be > 0".into()));
        }
        if self.synthesis.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "synthesis.poll_interval_ms must be > 0".into(),
            ));
        }
        if !(0.1..=2.0).contains(&self.synthesis.volume) {
            return Err(ConfigError::Invalid(format!(
                "synthesis.volume {} outside 0.1-2.0",
                self.synthesis.volume
            )));
        }
        if self.assembly.extension.is_empty() {
            return Err(ConfigError::Invalid("assembly.extension is empty".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.synthesis.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.synthesis.poll_interval_ms)
    }

    pub fn synthesis_settings(&self) -> SynthesisSettings {
        SynthesisSettings {
            rate_wpm: self.synthesis.rate_wpm,
            volume: self.synthesis.volume,
        }
    }

    pub fn voice_policy(&self) -> VoicePolicy {
        VoicePolicy {
            language: self.voices.language.clone(),
            agent_override: self.voices.agent.clone(),
            member_override: self.voices.member.clone(),
            ..VoicePolicy::default()
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat {
            codec: self.assembly.codec.clone(),
            quality: self.assembly.quality.clone(),
            container: self.assembly.container.clone(),
            extension: self.assembly.extension.clone(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} is not a number: '{}'", key, raw)))
}
