//! Line-by-line synthesis and assembly.
//!
//! parse -> assign voices -> (per line) request synthesis -> wait for the
//! artifact -> collect ready paths in line order -> concatenate -> clean up.
//! Lines are processed strictly one at a time.

pub mod assembler;
pub mod cleanup;
pub mod runner;
pub mod segment;
pub mod synthesizer;
pub mod waiter;

pub use assembler::Assembler;
pub use cleanup::ScratchDir;
pub use runner::{Pipeline, PipelineOptions, RunReport};
pub use segment::{Segment, SegmentState};
pub use synthesizer::SegmentSynthesizer;
pub use waiter::{ArtifactStatus, CompletionWaiter};
