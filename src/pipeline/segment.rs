use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::transcript::{Speaker, Utterance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SegmentState {
    Pending,
    Ready,
    /// Artifact exists but has zero bytes. Skipped, not fatal.
    Empty,
    Failed,
}

/// Per-utterance artifact and its completion state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub line_index: usize,
    pub speaker: Speaker,
    pub artifact_path: PathBuf,
    pub state: SegmentState,
    pub bytes: u64,
    pub audio_ms: Option<u64>,
}

impl Segment {
    pub fn pending(utterance: &Utterance, dir: &Path, extension: &str) -> Self {
        Self {
            line_index: utterance.line_index,
            speaker: utterance.speaker,
            artifact_path: dir.join(artifact_name(utterance.line_index, extension)),
            state: SegmentState::Pending,
            bytes: 0,
            audio_ms: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == SegmentState::Ready
    }
}

/// `line_007.wav`. Zero-padded to three digits so lexical order matches line
/// order for transcripts under a thousand lines.
pub fn artifact_name(line_index: usize, extension: &str) -> String {
    format!("line_{:03}.{}", line_index, extension)
}

/// Ready artifact paths in `line_index` order, whatever order they completed in.
pub fn ready_paths(segments: &[Segment]) -> Vec<PathBuf> {
    let mut ready: Vec<&Segment> = segments.iter().filter(|s| s.is_ready()).collect();
    ready.sort_by_key(|s| s.line_index);
    ready.into_iter().map(|s| s.artifact_path.clone()).collect()
}
