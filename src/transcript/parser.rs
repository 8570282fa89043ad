use tracing::debug;

use super::types::{Speaker, Transcript, Utterance};
use crate::error::{PipelineError, Result};

/// PURE FUNCTION: raw transcript text -> ordered utterances.
///
/// Lines are trimmed before the marker check. A line without a known marker
/// and a marker line with no text are the same outcome: skipped.
pub fn parse_transcript(raw: &str) -> Result<Transcript> {
    if raw.trim().is_empty() {
        return Err(PipelineError::EmptyTranscript);
    }

    let mut transcript = Transcript::default();

    for (offset, line) in raw.lines().enumerate() {
        let physical = offset + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match split_marker(line) {
            Some((speaker, text)) => {
                let line_index = transcript.utterances.len() + 1;
                transcript.utterances.push(Utterance {
                    line_index,
                    speaker,
                    text: text.to_string(),
                });
            }
            None => {
                debug!(line = physical, "Skipping line without speaker text");
                transcript.skipped_lines.push(physical);
            }
        }
    }

    Ok(transcript)
}

fn split_marker(line: &str) -> Option<(Speaker, &str)> {
    Speaker::ALL.iter().find_map(|speaker| {
        let text = line.strip_prefix(speaker.marker())?.trim();
        (!text.is_empty()).then_some((*speaker, text))
    })
}
