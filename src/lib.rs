pub mod config;
pub mod error;
pub mod pipeline;
pub mod services;
pub mod telemetry;
pub mod transcript;
pub mod voice;

pub use error::{PipelineError, PipelineWarning};
pub use pipeline::{Pipeline, PipelineOptions, RunReport};

/// Sample support call used by `parley render --sample`.
pub const SAMPLE_TRANSCRIPT: &str = include_str!("../assets/sample_call.txt");
