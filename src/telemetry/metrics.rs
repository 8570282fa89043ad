use std::collections::VecDeque;

use serde::Serialize;

use super::event::PipelineEvent;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub skipped_lines: usize,
    pub requested: usize,
    pub ready: usize,
    pub empty: usize,
    pub failed: usize,
    pub segment_bytes: u64,
    pub audio_ms: u64,
    pub total_wait_ms: u64,
    pub max_wait_ms: u64,
    pub assembled_segments: usize,
    pub combined_bytes: u64,
    pub cleanup_failures: usize,
}

pub fn compute_snapshot(events: &VecDeque<PipelineEvent>) -> RunStats {
    let mut stats = RunStats::default();

    for event in events {
        match event {
            PipelineEvent::LinesSkipped { count } => stats.skipped_lines += count,
            PipelineEvent::SynthesisRequested { .. } => stats.requested += 1,
            PipelineEvent::SegmentReady {
                bytes,
                audio_ms,
                wait_ms,
                ..
            } => {
                stats.ready += 1;
                stats.segment_bytes += bytes;
                stats.audio_ms += audio_ms.unwrap_or(0);
                stats.total_wait_ms += wait_ms;
                stats.max_wait_ms = stats.max_wait_ms.max(*wait_ms);
            }
            PipelineEvent::SegmentEmpty { .. } => stats.empty += 1,
            PipelineEvent::SegmentFailed { .. } => stats.failed += 1,
            PipelineEvent::Assembled { segments, bytes } => {
                stats.assembled_segments = *segments;
                stats.combined_bytes = *bytes;
            }
            PipelineEvent::AssemblyFailed => {}
            PipelineEvent::CleanupFailed { removals } => stats.cleanup_failures += removals,
        }
    }

    stats
}
