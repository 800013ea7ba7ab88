//! Playback requests queued by the scheduler

use super::control::ControlHandle;
use std::time::Instant;
use uuid::Uuid;

/// Unique identifier of a single playback request
pub type RequestId = Uuid;

/// What a request vocalizes, which decides its queue position and voice profile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// A single vocabulary word, appended to the tail of the queue
    Word,

    /// A full example sentence, inserted at the head of the queue
    Sentence,
}

impl RequestKind {
    /// Sentence playback jumps ahead of queued words
    pub fn is_priority(self) -> bool {
        matches!(self, RequestKind::Sentence)
    }
}

/// One pending or active playback unit
#[derive(Clone, Debug)]
pub struct SpeechRequest {
    /// Request ID for tracking engine events
    pub id: RequestId,

    /// The literal content to vocalize
    pub text: String,

    /// Word or sentence
    pub kind: RequestKind,

    /// The control that asked for playback, if any
    pub origin: ControlHandle,

    /// When the request entered the queue
    pub queued_at: Instant,
}

impl SpeechRequest {
    /// Create a word request
    pub fn word(text: impl Into<String>, origin: ControlHandle, now: Instant) -> Self {
        Self::new(text, RequestKind::Word, origin, now)
    }

    /// Create a sentence request
    pub fn sentence(text: impl Into<String>, origin: ControlHandle, now: Instant) -> Self {
        Self::new(text, RequestKind::Sentence, origin, now)
    }

    fn new(text: impl Into<String>, kind: RequestKind, origin: ControlHandle, now: Instant) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            kind,
            origin,
            queued_at: now,
        }
    }

    /// True for sentence playback
    pub fn is_priority(&self) -> bool {
        self.kind.is_priority()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_by_kind() {
        let now = Instant::now();
        let word = SpeechRequest::word("Haus", ControlHandle::none(), now);
        let sentence = SpeechRequest::sentence("Das Haus ist alt.", ControlHandle::none(), now);

        assert!(!word.is_priority());
        assert!(sentence.is_priority());
        assert_ne!(word.id, sentence.id);
    }
}
