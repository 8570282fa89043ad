use serde::{Deserialize, Serialize};

use crate::transcript::Speaker;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineEvent {
    LinesSkipped {
        count: usize,
    },

    SynthesisRequested {
        line_index: usize,
        speaker: Speaker,
    },

    SegmentReady {
        line_index: usize,
        bytes: u64,
        /// Decoded length, when the artifact is WAV.
        audio_ms: Option<u64>,
        wait_ms: u64,
    },

    SegmentEmpty {
        line_index: usize,
    },

    SegmentFailed {
        line_index: usize,
        kind: FailureKind,
    },

    Assembled {
        segments: usize,
        bytes: u64,
    },

    AssemblyFailed,

    CleanupFailed {
        removals: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Synthesis,
    Timeout,
    Io,
}
