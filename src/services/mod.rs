pub mod concat;
pub mod tts;
