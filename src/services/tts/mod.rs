//! Local text-to-speech backends.
//!
//! Each backend drives a CLI engine and writes one artifact per request:
//! - espeak-ng (WAV, widely available)
//! - say (AIFF, macOS)
//! - piper (WAV, requires a directory of `.onnx` voice models)
//!
//! Requests are funnelled through [`EngineHandle`], which owns the engine
//! exclusively so only one synthesis is ever in flight.

pub mod engine;
pub mod espeak;
pub mod path;
pub mod piper;
pub mod say;

pub use engine::{EngineError, EngineHandle, SpeechEngine, SynthesisSettings};

use tracing::info;

use crate::config::{EngineKind, EnginesConfig};
use espeak::EspeakEngine;
use piper::PiperEngine;
use say::SayEngine;

/// Resolve a concrete backend. `Auto` prefers `say` on macOS, then piper when
/// a voice directory is configured, then espeak-ng.
pub fn build_engine(
    kind: EngineKind,
    engines: &EnginesConfig,
    settings: SynthesisSettings,
) -> Result<Box<dyn SpeechEngine>, EngineError> {
    let espeak_bin = || path::find_binary(engines.espeak_bin.as_deref(), &["espeak-ng", "espeak"]);
    let say_bin = || path::find_binary(engines.say_bin.as_deref(), &["say"]);
    let piper_bin = || path::find_binary(engines.piper_bin.as_deref(), &["piper"]);

    let engine: Box<dyn SpeechEngine> = match kind {
        EngineKind::EspeakNg => {
            let bin = espeak_bin().ok_or(EngineError::MissingBinary { engine: "espeak-ng" })?;
            Box::new(EspeakEngine::new(bin, settings))
        }
        EngineKind::Say => {
            let bin = say_bin().ok_or(EngineError::MissingBinary { engine: "say" })?;
            Box::new(SayEngine::new(bin, settings))
        }
        EngineKind::Piper => {
            let bin = piper_bin().ok_or(EngineError::MissingBinary { engine: "piper" })?;
            let dir = engines.piper_voice_dir.clone().ok_or_else(|| {
                EngineError::Voice("piper requires a voice directory (PIPER_VOICE_DIR)".into())
            })?;
            Box::new(PiperEngine::new(bin, dir, settings))
        }
        EngineKind::Auto => {
            if let Some(bin) = say_bin().filter(|_| cfg!(target_os = "macos")) {
                Box::new(SayEngine::new(bin, settings))
            } else if let (Some(bin), Some(dir)) = (piper_bin(), engines.piper_voice_dir.clone()) {
                Box::new(PiperEngine::new(bin, dir, settings))
            } else if let Some(bin) = espeak_bin() {
                Box::new(EspeakEngine::new(bin, settings))
            } else {
                return Err(EngineError::MissingBinary {
                    engine: "espeak-ng, say or piper",
                });
            }
        }
    };

    info!(engine = engine.name(), "Speech engine ready");
    Ok(engine)
}
