use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    /// Lenient parse of engine gender markers: `male`, `M`, `VoiceGenderMale`, ...
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        let lowered = lowered.strip_prefix("voicegender").unwrap_or(&lowered);
        match lowered {
            "f" | "female" | "woman" => Some(Gender::Female),
            "m" | "male" | "man" => Some(Gender::Male),
            _ => None,
        }
    }
}

/// One entry of an engine's voice catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceInfo {
    /// Opaque identifier handed back to the engine.
    pub id: String,
    pub name: String,
    pub locale_tags: Vec<String>,
    pub gender: Option<Gender>,
}

impl VoiceInfo {
    /// True when any locale tag's language subtag equals `language`
    /// (`en` matches `en`, `en-US`, `en_GB`).
    pub fn speaks(&self, language: &str) -> bool {
        self.locale_tags.iter().any(|tag| {
            tag.split(['-', '_'])
                .next()
                .is_some_and(|subtag| subtag.eq_ignore_ascii_case(language))
        })
    }
}
