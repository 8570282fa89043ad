//! Pipeline telemetry.
//!
//! # PRIVACY INVARIANT
//! Events carry line indices, sizes and durations only. Transcript text and
//! voice ids never enter the recorder.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::PipelineEvent;
pub use metrics::{compute_snapshot, RunStats};
pub use recorder::TelemetryRecorder;
