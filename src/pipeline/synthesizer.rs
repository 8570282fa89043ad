use std::path::Path;

use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use super::segment::{Segment, SegmentState};
use super::waiter::{ArtifactStatus, CompletionWaiter, WaitError};
use crate::error::{PipelineError, Result};
use crate::services::tts::EngineHandle;
use crate::telemetry::event::FailureKind;
use crate::telemetry::{PipelineEvent, TelemetryRecorder};
use crate::transcript::Utterance;
use crate::voice::VoiceAssignment;

/// Issues one synthesis request per utterance and confirms its artifact.
pub struct SegmentSynthesizer {
    engine: EngineHandle,
    waiter: CompletionWaiter,
}

impl SegmentSynthesizer {
    pub fn new(engine: EngineHandle, waiter: CompletionWaiter) -> Self {
        Self { engine, waiter }
    }

    pub fn plan(&self, utterance: &Utterance, dir: &Path) -> Segment {
        Segment::pending(utterance, dir, self.engine.artifact_extension())
    }

    /// Drive `segment` from `Pending` to `Ready`, `Empty` or `Failed`.
    ///
    /// The timeout budget covers the request and the wait together; a
    /// blocking backend that hangs is cut off at the same deadline.
    pub async fn complete(
        &self,
        segment: &mut Segment,
        utterance: &Utterance,
        voices: &VoiceAssignment,
        telemetry: &mut TelemetryRecorder,
    ) -> Result<()> {
        let line_index = utterance.line_index;
        let voice_id = voices.voice_for(utterance.speaker);
        let started = Instant::now();
        let deadline = started + self.waiter.timeout;

        info!(line = line_index, speaker = %utterance.speaker, "Requesting synthesis");
        telemetry.record(PipelineEvent::SynthesisRequested {
            line_index,
            speaker: utterance.speaker,
        });

        let request = self
            .engine
            .synthesize(&utterance.text, voice_id, &segment.artifact_path);
        let requested = timeout_at(deadline, request).await;
        let outcome = match requested {
            Ok(Ok(())) => self.waiter.wait_until(&segment.artifact_path, deadline).await,
            Ok(Err(e)) => {
                return Err(self.fail(segment, telemetry, FailureKind::Synthesis, || {
                    PipelineError::Synthesis {
                        line_index,
                        message: e.to_string(),
                    }
                }))
            }
            Err(_) => Err(WaitError::Timeout(segment.artifact_path.clone())),
        };

        match outcome {
            Ok(ArtifactStatus::Ready { bytes }) => {
                let wait_ms = started.elapsed().as_millis() as u64;
                segment.state = SegmentState::Ready;
                segment.bytes = bytes;
                let artifact = segment.artifact_path.clone();
                segment.audio_ms = tokio::task::spawn_blocking(move || wav_duration_ms(&artifact))
                    .await
                    .ok()
                    .flatten();
                debug!(line = line_index, bytes, wait_ms, "Segment ready");
                telemetry.record(PipelineEvent::SegmentReady {
                    line_index,
                    bytes,
                    audio_ms: segment.audio_ms,
                    wait_ms,
                });
                Ok(())
            }
            Ok(ArtifactStatus::Empty) => {
                warn!(line = line_index, path = ?segment.artifact_path, "Generated file is empty; skipping line");
                segment.state = SegmentState::Empty;
                telemetry.record(PipelineEvent::SegmentEmpty { line_index });
                Ok(())
            }
            Err(WaitError::Timeout(path)) => {
                Err(self.fail(segment, telemetry, FailureKind::Timeout, || {
                    PipelineError::Timeout {
                        line_index,
                        path,
                        timeout: self.waiter.timeout,
                    }
                }))
            }
            Err(WaitError::Io { path, source }) => {
                Err(self.fail(segment, telemetry, FailureKind::Io, || {
                    PipelineError::io(path, source)
                }))
            }
        }
    }

    fn fail(
        &self,
        segment: &mut Segment,
        telemetry: &mut TelemetryRecorder,
        kind: FailureKind,
        error: impl FnOnce() -> PipelineError,
    ) -> PipelineError {
        segment.state = SegmentState::Failed;
        telemetry.record(PipelineEvent::SegmentFailed {
            line_index: segment.line_index,
            kind,
        });
        error()
    }
}

/// Length of a WAV artifact; `None` for other formats or unreadable headers.
fn wav_duration_ms(path: &Path) -> Option<u64> {
    if !path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("wav")) {
        return None;
    }
    let reader = hound::WavReader::open(path).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return None;
    }
    Some(u64::from(reader.duration()) * 1000 / u64::from(spec.sample_rate))
}
