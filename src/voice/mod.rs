pub mod assignment;
pub mod catalog;

pub use assignment::{assign_voices, VoiceAssignment, VoicePolicy};
pub use catalog::{Gender, VoiceInfo};
