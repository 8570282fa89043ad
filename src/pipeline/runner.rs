use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::assembler::Assembler;
use super::cleanup::ScratchDir;
use super::segment::{ready_paths, Segment, SegmentState};
use super::synthesizer::SegmentSynthesizer;
use super::waiter::CompletionWaiter;
use crate::error::{PipelineError, PipelineWarning, Result};
use crate::services::concat::{Concatenator, OutputFormat};
use crate::services::tts::EngineHandle;
use crate::telemetry::{PipelineEvent, RunStats, TelemetryRecorder};
use crate::transcript::{parse_transcript, Transcript};
use crate::voice::{assign_voices, VoiceAssignment, VoicePolicy};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub output_dir: PathBuf,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub policy: VoicePolicy,
    pub format: OutputFormat,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        let waiter = CompletionWaiter::default();
        Self {
            output_dir: PathBuf::from("conversation_audio"),
            timeout: waiter.timeout,
            poll_interval: waiter.poll_interval,
            policy: VoicePolicy::default(),
            format: OutputFormat::default(),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub engine: String,
    pub output: PathBuf,
    pub voices: VoiceAssignment,
    pub segments: Vec<Segment>,
    pub warnings: Vec<PipelineWarning>,
    pub skipped_lines: Vec<usize>,
    pub stats: RunStats,
}

impl RunReport {
    pub fn ready_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_ready()).count()
    }
}

pub struct Pipeline {
    engine: EngineHandle,
    synthesizer: SegmentSynthesizer,
    assembler: Assembler,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        engine: EngineHandle,
        concatenator: Arc<dyn Concatenator>,
        options: PipelineOptions,
    ) -> Self {
        let waiter = CompletionWaiter::new(options.timeout, options.poll_interval);
        Self {
            synthesizer: SegmentSynthesizer::new(engine.clone(), waiter),
            assembler: Assembler::new(
                concatenator,
                options.output_dir.clone(),
                options.format.clone(),
            ),
            engine,
            options,
        }
    }

    /// Select voices from the engine catalog under the configured policy.
    pub async fn select_voices(&self) -> Result<VoiceAssignment> {
        let catalog = self.engine.list_voices().await.map_err(|e| {
            error!(error = %e, "Voice catalog unavailable");
            PipelineError::Catalog(e.to_string())
        })?;
        debug!(voices = catalog.len(), "Voice catalog loaded");
        assign_voices(&catalog, &self.options.policy)
    }

    /// Render `raw` into one combined artifact.
    ///
    /// Parse and voice errors surface before anything touches the disk. From
    /// the moment the scratch directory exists, cleanup runs on every path.
    pub async fn run(&self, raw: &str) -> Result<RunReport> {
        let transcript = parse_transcript(raw)?;
        let voices = self.select_voices().await?;

        let run_id = Uuid::new_v4();
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        info!(
            run = %run_id,
            lines = transcript.len(),
            skipped = transcript.skipped_lines.len(),
            "Processing conversation line by line"
        );

        let mut telemetry = TelemetryRecorder::new();
        if !transcript.skipped_lines.is_empty() {
            telemetry.record(PipelineEvent::LinesSkipped {
                count: transcript.skipped_lines.len(),
            });
        }

        let mut scratch = ScratchDir::create(&self.options.output_dir, &run_id).await?;
        let mut segments = Vec::with_capacity(transcript.len());

        let rendered = self
            .render(&transcript, &voices, &stamp, &mut scratch, &mut segments, &mut telemetry)
            .await;

        let cleanup = scratch.cleanup().await;
        debug!(removed = cleanup.removed, failures = cleanup.failures, "Cleaned up temporary files");
        if cleanup.failures > 0 {
            telemetry.record(PipelineEvent::CleanupFailed {
                removals: cleanup.failures,
            });
        }

        let output = rendered?;
        let warnings = segments
            .iter()
            .filter(|s| s.state == SegmentState::Empty)
            .map(|s| PipelineWarning::EmptySegment {
                line_index: s.line_index,
                path: s.artifact_path.clone(),
            })
            .collect();

        Ok(RunReport {
            run_id: run_id.to_string(),
            engine: self.engine.name().to_string(),
            output,
            voices,
            segments,
            warnings,
            skipped_lines: transcript.skipped_lines,
            stats: telemetry.snapshot(),
        })
    }

    async fn render(
        &self,
        transcript: &Transcript,
        voices: &VoiceAssignment,
        stamp: &str,
        scratch: &mut ScratchDir,
        segments: &mut Vec<Segment>,
        telemetry: &mut TelemetryRecorder,
    ) -> Result<PathBuf> {
        // 1. Synthesize: one line at a time, each confirmed before the next.
        for utterance in &transcript.utterances {
            let mut segment = self.synthesizer.plan(utterance, scratch.path());
            scratch.track(segment.artifact_path.clone());
            let completed = self
                .synthesizer
                .complete(&mut segment, utterance, voices, telemetry)
                .await;
            segments.push(segment);
            completed?;
        }

        // 2. Assemble in line order.
        let ready = ready_paths(segments);
        let assembled = self
            .assembler
            .assemble(&ready, &scratch.manifest_path(), stamp)
            .await;

        match assembled {
            Ok(output) => {
                let bytes = tokio::fs::metadata(&output)
                    .await
                    .map(|m| m.len())
                    .unwrap_or(0);
                telemetry.record(PipelineEvent::Assembled {
                    segments: ready.len(),
                    bytes,
                });
                info!(output = ?output, segments = ready.len(), "Combined all audio segments");
                Ok(output)
            }
            Err(e) => {
                telemetry.record(PipelineEvent::AssemblyFailed);
                Err(e)
            }
        }
    }
}
