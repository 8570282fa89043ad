use serde::{Deserialize, Serialize};

/// The two dialogue roles. `Agent` is role A, `Member` is role B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Agent,
    Member,
}

impl Speaker {
    pub const ALL: [Speaker; 2] = [Speaker::Agent, Speaker::Member];

    /// Line prefix that attributes a transcript line to this speaker.
    pub fn marker(&self) -> &'static str {
        match self {
            Speaker::Agent => "Agent:",
            Speaker::Member => "Member:",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Agent => "Agent",
            Speaker::Member => "Member",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One accepted, speaker-attributed transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Utterance {
    /// 1-based, counts accepted lines only.
    pub line_index: usize,
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub utterances: Vec<Utterance>,
    /// Physical (1-based) line numbers of non-blank lines that were skipped.
    pub skipped_lines: Vec<usize>,
}

impl Transcript {
    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }
}
