use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use super::catalog::{Gender, VoiceInfo};
use crate::error::{PipelineError, Result};
use crate::transcript::Speaker;

/// Adjustable selection policy. The defaults reproduce the classic pairing:
/// an English female Agent and an English male Member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicePolicy {
    pub language: String,
    pub agent_gender: Gender,
    pub member_gender: Gender,
    pub agent_override: Option<String>,
    pub member_override: Option<String>,
}

impl Default for VoicePolicy {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            agent_gender: Gender::Female,
            member_gender: Gender::Male,
            agent_override: None,
            member_override: None,
        }
    }
}

impl VoicePolicy {
    fn gender_for(&self, speaker: Speaker) -> Gender {
        match speaker {
            Speaker::Agent => self.agent_gender,
            Speaker::Member => self.member_gender,
        }
    }

    fn override_for(&self, speaker: Speaker) -> Option<&str> {
        match speaker {
            Speaker::Agent => self.agent_override.as_deref(),
            Speaker::Member => self.member_override.as_deref(),
        }
    }
}

/// Speaker -> voice id, fixed for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VoiceAssignment {
    voices: HashMap<Speaker, String>,
}

impl VoiceAssignment {
    pub fn new(agent: impl Into<String>, member: impl Into<String>) -> Self {
        let mut voices = HashMap::new();
        voices.insert(Speaker::Agent, agent.into());
        voices.insert(Speaker::Member, member.into());
        Self { voices }
    }

    pub fn voice_for(&self, speaker: Speaker) -> &str {
        // Both roles are always populated by the constructor.
        self.voices.get(&speaker).map(String::as_str).unwrap_or_default()
    }
}

/// PURE FUNCTION: catalog + policy -> assignment.
///
/// First match wins. Without a match the Agent falls back to the first
/// catalog entry and the Member to the last.
pub fn assign_voices(catalog: &[VoiceInfo], policy: &VoicePolicy) -> Result<VoiceAssignment> {
    let (first, last) = match (catalog.first(), catalog.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(PipelineError::NoVoicesAvailable),
    };

    let pick = |speaker: Speaker, fallback: &VoiceInfo| -> String {
        if let Some(id) = policy.override_for(speaker) {
            if !catalog.iter().any(|v| v.id == id) {
                warn!(role = %speaker, voice = id, "Override voice not in catalog; using it verbatim");
            }
            return id.to_string();
        }

        let wanted = policy.gender_for(speaker);
        catalog
            .iter()
            .find(|v| v.speaks(&policy.language) && v.gender == Some(wanted))
            .unwrap_or(fallback)
            .id
            .clone()
    };

    let agent = pick(Speaker::Agent, first);
    let member = pick(Speaker::Member, last);
    info!(agent = %agent, member = %member, "Voices selected");

    Ok(VoiceAssignment::new(agent, member))
}
