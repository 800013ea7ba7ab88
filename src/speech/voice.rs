//! Voice profiles and German voice selection

use super::request::RequestKind;

/// Default utterance language
pub const DEFAULT_LANGUAGE: &str = "de-DE";

/// Word playback: slow and slightly higher pitched so single words are clear
pub const WORD_PROFILE: VoiceProfile = VoiceProfile {
    rate: 0.75,
    pitch: 1.2,
    volume: 0.9,
};

/// Sentence playback: closer to natural speed
pub const SENTENCE_PROFILE: VoiceProfile = VoiceProfile {
    rate: 0.8,
    pitch: 1.1,
    volume: 0.9,
};

/// Vocalization parameters handed to the host engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceProfile {
    /// Speech rate (1.0 = host default)
    pub rate: f32,

    /// Pitch (1.0 = host default)
    pub pitch: f32,

    /// Volume in [0, 1]
    pub volume: f32,
}

impl VoiceProfile {
    /// The fixed profile for a request kind
    pub fn for_kind(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Word => WORD_PROFILE,
            RequestKind::Sentence => SENTENCE_PROFILE,
        }
    }
}

/// A voice advertised by the host engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,

    /// BCP 47 language tag, e.g. `de-DE`
    pub lang: String,

    /// Synthesized locally rather than by a remote service
    pub local_service: bool,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, lang: impl Into<String>, local_service: bool) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            local_service,
        }
    }
}

/// Pick the best German voice from the host's list
///
/// Preference order: a local `de-DE` voice, then any `de*` voice, then any
/// voice whose name mentions German.
pub fn select_german_voice(voices: &[VoiceInfo]) -> Option<&VoiceInfo> {
    voices
        .iter()
        .find(|v| v.lang == DEFAULT_LANGUAGE && v.local_service)
        .or_else(|| voices.iter().find(|v| v.lang.starts_with("de")))
        .or_else(|| {
            voices.iter().find(|v| {
                let name = v.name.to_lowercase();
                ["german", "deutsch", "deutsche"]
                    .iter()
                    .any(|needle| name.contains(needle))
            })
        })
}
