pub mod parser;
pub mod types;

pub use parser::parse_transcript;
pub use types::{Speaker, Transcript, Utterance};
