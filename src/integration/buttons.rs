//! Click handlers for the speaker buttons on word cards and example sentences
//!
//! Whether the host can speak at all is decided here, once per click, and not
//! inside the scheduler. Without a speech engine a word click toggles a
//! textual pronunciation guide and a sentence click flashes the error glyph.

use crate::integration::config::SpeechConfig;
use crate::speech::control::{AudioButton, ControlHandle, PlaybackControl};
use crate::speech::pipeline::SpeechHandle;
use crate::speech::request::RequestKind;
use crate::{Result, VokabelError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Instant;
use tracing::debug;

/// Where learners are pointed when the host cannot speak
pub const PRONUNCIATION_RESOURCES: [&str; 3] = ["Google Translate", "Forvo.com", "Yandex Translate"];

/// Textual stand-in for audio playback
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PronunciationGuide {
    pub word: String,
    pub caption: &'static str,
    pub resources: &'static [&'static str],
}

impl PronunciationGuide {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            caption: "Russian pronunciation",
            resources: &PRONUNCIATION_RESOURCES,
        }
    }
}

/// What a click resulted in
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The button carried no text
    Ignored,

    /// Playback was queued with the scheduler
    Queued,

    /// No speech engine: a guide was opened for the word
    GuideShown(PronunciationGuide),

    /// No speech engine: the open guide was closed again
    GuideHidden,

    /// No speech engine: the button shows the error glyph for a while
    Unavailable,
}

/// Listening progress fed into the achievement system
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListeningCounts {
    #[serde(default)]
    pub listening_count: u64,

    #[serde(default)]
    pub sentences_listened_count: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_listened: Option<DateTime<Utc>>,
}

impl ListeningCounts {
    fn record(&mut self, kind: RequestKind) {
        match kind {
            RequestKind::Word => self.listening_count += 1,
            RequestKind::Sentence => self.sentences_listened_count += 1,
        }
        self.last_listened = Some(Utc::now());
    }
}

/// Receives a notification for every accepted click
pub trait ListeningTracker: Send + Sync {
    fn track(&self, kind: RequestKind, counts: &ListeningCounts);
}

/// A guide belongs to the card whose button opened it
struct OpenGuide {
    word: String,
    button: Weak<AudioButton>,
    opened_at: Instant,
}

impl OpenGuide {
    fn belongs_to(&self, button: &Arc<AudioButton>) -> bool {
        std::ptr::eq(self.button.as_ptr(), Arc::as_ptr(button))
    }
}

struct GlyphRevert {
    button: Weak<AudioButton>,
    deadline: Instant,
}

/// Speaker button handlers shared by the card grid, the dictionary and exercises
pub struct AudioButtons {
    speech: Option<SpeechHandle>,
    config: SpeechConfig,
    guides: Mutex<Vec<OpenGuide>>,
    reverts: Mutex<Vec<GlyphRevert>>,
    counts: Mutex<ListeningCounts>,
    tracker: Option<Arc<dyn ListeningTracker>>,
}

impl AudioButtons {
    /// Create handlers; `None` means the host has no speech engine
    pub fn new(speech: Option<SpeechHandle>, config: SpeechConfig) -> Self {
        Self {
            speech,
            config,
            guides: Mutex::new(Vec::new()),
            reverts: Mutex::new(Vec::new()),
            counts: Mutex::new(ListeningCounts::default()),
            tracker: None,
        }
    }

    /// Notify `tracker` about every accepted click
    pub fn with_tracker(mut self, tracker: Arc<dyn ListeningTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Start from previously saved counts
    pub fn with_counts(self, counts: ListeningCounts) -> Self {
        *self.counts.lock() = counts;
        self
    }

    pub fn host_available(&self) -> bool {
        self.speech.is_some()
    }

    fn speech(&self) -> Result<&SpeechHandle> {
        self.speech.as_ref().ok_or(VokabelError::HostUnavailable)
    }

    /// Speaker button on a word card
    pub fn word_clicked(&self, word: &str, button: &Arc<AudioButton>) -> Result<ClickOutcome> {
        self.word_clicked_at(word, button, Instant::now())
    }

    pub fn word_clicked_at(
        &self,
        word: &str,
        button: &Arc<AudioButton>,
        now: Instant,
    ) -> Result<ClickOutcome> {
        if word.is_empty() {
            return Ok(ClickOutcome::Ignored);
        }

        let outcome = match self.speech() {
            Ok(speech) => {
                speech.speak_word(word, ControlHandle::new(button))?;
                ClickOutcome::Queued
            }
            Err(e) => {
                debug!("{}, toggling pronunciation guide for {}", e, word);
                self.toggle_guide(word, button, now)
            }
        };

        self.track(RequestKind::Word);
        Ok(outcome)
    }

    /// Speaker button next to an example sentence
    pub fn sentence_clicked(&self, sentence: &str, button: &Arc<AudioButton>) -> Result<ClickOutcome> {
        self.sentence_clicked_at(sentence, button, Instant::now())
    }

    pub fn sentence_clicked_at(
        &self,
        sentence: &str,
        button: &Arc<AudioButton>,
        now: Instant,
    ) -> Result<ClickOutcome> {
        if sentence.is_empty() {
            return Ok(ClickOutcome::Ignored);
        }

        let outcome = match self.speech() {
            Ok(speech) => {
                speech.speak_sentence(sentence, ControlHandle::new(button))?;
                ClickOutcome::Queued
            }
            Err(e) => {
                debug!("{}, flashing error glyph", e);
                button.on_error();
                self.reverts.lock().push(GlyphRevert {
                    button: Arc::downgrade(button),
                    deadline: now + self.config.error_glyph_duration,
                });
                ClickOutcome::Unavailable
            }
        };

        self.track(RequestKind::Sentence);
        Ok(outcome)
    }

    /// Whether `button`'s card currently shows a guide
    pub fn guide_open(&self, button: &Arc<AudioButton>) -> bool {
        self.guides.lock().iter().any(|guide| guide.belongs_to(button))
    }

    /// Close expired guides and revert expired error glyphs
    ///
    /// Called from the host's event loop.
    pub fn tick(&self, now: Instant) {
        let guide_duration = self.config.guide_duration;
        self.guides.lock().retain(|guide| {
            let Some(button) = guide.button.upgrade() else {
                return false;
            };
            let open = now.saturating_duration_since(guide.opened_at) < guide_duration;
            if !open {
                debug!("Pronunciation guide for {} timed out", guide.word);
                button.set_guide_open(false);
            }
            open
        });

        self.reverts.lock().retain(|revert| {
            if revert.deadline > now {
                return true;
            }
            if let Some(button) = revert.button.upgrade() {
                button.on_ready();
            }
            false
        });
    }

    pub fn counts(&self) -> ListeningCounts {
        self.counts.lock().clone()
    }

    /// Serialize the counts for the achievement store
    pub fn counts_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&*self.counts.lock())?)
    }

    /// Parse counts saved by [`AudioButtons::counts_json`]
    pub fn parse_counts(json: &str) -> Result<ListeningCounts> {
        Ok(serde_json::from_str(json)?)
    }

    fn toggle_guide(&self, word: &str, button: &Arc<AudioButton>, now: Instant) -> ClickOutcome {
        let mut guides = self.guides.lock();
        if let Some(index) = guides.iter().position(|guide| guide.belongs_to(button)) {
            guides.remove(index);
            button.set_guide_open(false);
            return ClickOutcome::GuideHidden;
        }

        guides.push(OpenGuide {
            word: word.to_string(),
            button: Arc::downgrade(button),
            opened_at: now,
        });
        button.set_guide_open(true);
        ClickOutcome::GuideShown(PronunciationGuide::new(word))
    }

    fn track(&self, kind: RequestKind) {
        let counts = {
            let mut counts = self.counts.lock();
            counts.record(kind);
            counts.clone()
        };
        if let Some(tracker) = &self.tracker {
            tracker.track(kind, &counts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::control::Glyph;
    use crate::speech::pipeline::SpeechPipeline;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingTracker {
        seen: Mutex<Vec<RequestKind>>,
    }

    impl ListeningTracker for CountingTracker {
        fn track(&self, kind: RequestKind, _counts: &ListeningCounts) {
            self.seen.lock().push(kind);
        }
    }

    fn offline() -> AudioButtons {
        AudioButtons::new(None, SpeechConfig::default())
    }

    #[test]
    fn test_empty_click_is_ignored() {
        let buttons = offline();
        let button = AudioButton::new();
        assert_eq!(buttons.word_clicked("", &button).unwrap(), ClickOutcome::Ignored);
        assert_eq!(buttons.sentence_clicked("", &button).unwrap(), ClickOutcome::Ignored);
        assert_eq!(buttons.counts(), ListeningCounts::default());
        assert!(!buttons.guide_open(&button));
    }

    #[test]
    fn test_guide_toggles() {
        let buttons = offline();
        let button = AudioButton::new();
        let t0 = Instant::now();

        let outcome = buttons.word_clicked_at("Haus", &button, t0).unwrap();
        match outcome {
            ClickOutcome::GuideShown(guide) => {
                assert_eq!(guide.word, "Haus");
                assert!(guide.resources.contains(&"Forvo.com"));
            }
            other => panic!("Unexpected outcome: {:?}", other),
        }
        assert!(buttons.guide_open(&button));
        assert!(button.state().guide_open);

        let outcome = buttons.word_clicked_at("Haus", &button, t0).unwrap();
        assert_eq!(outcome, ClickOutcome::GuideHidden);
        assert!(!buttons.guide_open(&button));
        assert!(!button.state().guide_open);
    }

    #[test]
    fn test_guide_belongs_to_its_card() {
        let buttons = offline();
        let first_card = AudioButton::new();
        let second_card = AudioButton::new();
        let t0 = Instant::now();

        buttons.word_clicked_at("Haus", &first_card, t0).unwrap();
        let outcome = buttons.word_clicked_at("Haus", &second_card, t0).unwrap();
        assert!(matches!(outcome, ClickOutcome::GuideShown(_)));
        assert!(buttons.guide_open(&first_card));
        assert!(buttons.guide_open(&second_card));
        assert!(first_card.state().guide_open);
        assert!(second_card.state().guide_open);

        // Closing one card leaves the other open
        let outcome = buttons.word_clicked_at("Haus", &first_card, t0).unwrap();
        assert_eq!(outcome, ClickOutcome::GuideHidden);
        assert!(!first_card.state().guide_open);
        assert!(buttons.guide_open(&second_card));
        assert!(second_card.state().guide_open);
    }

    #[test]
    fn test_guide_auto_dismisses() {
        let buttons = offline();
        let button = AudioButton::new();
        let t0 = Instant::now();

        buttons.word_clicked_at("Baum", &button, t0).unwrap();
        buttons.tick(t0 + Duration::from_secs(9));
        assert!(buttons.guide_open(&button));

        buttons.tick(t0 + Duration::from_secs(10));
        assert!(!buttons.guide_open(&button));
        assert!(!button.state().guide_open);
    }

    #[test]
    fn test_sentence_without_host_flashes_error() {
        let buttons = offline();
        let button = AudioButton::new();
        let t0 = Instant::now();

        let outcome = buttons
            .sentence_clicked_at("Der Baum ist grün.", &button, t0)
            .unwrap();
        assert_eq!(outcome, ClickOutcome::Unavailable);
        assert_eq!(button.state().glyph, Glyph::Error);

        buttons.tick(t0 + Duration::from_millis(1000));
        assert_eq!(button.state().glyph, Glyph::Error);

        buttons.tick(t0 + Duration::from_millis(1500));
        assert_eq!(button.state().glyph, Glyph::Ready);
    }

    #[test]
    fn test_clicks_are_tracked() {
        let tracker = Arc::new(CountingTracker::default());
        let buttons = offline().with_tracker(tracker.clone());
        let button = AudioButton::new();

        buttons.word_clicked("Haus", &button).unwrap();
        buttons.word_clicked("Haus", &button).unwrap();
        buttons.sentence_clicked("Das Haus ist alt.", &button).unwrap();

        let counts = buttons.counts();
        assert_eq!(counts.listening_count, 2);
        assert_eq!(counts.sentences_listened_count, 1);
        assert!(counts.last_listened.is_some());
        assert_eq!(
            *tracker.seen.lock(),
            vec![RequestKind::Word, RequestKind::Word, RequestKind::Sentence]
        );
    }

    #[test]
    fn test_counts_json_keys() {
        let buttons = offline().with_counts(ListeningCounts {
            listening_count: 49,
            sentences_listened_count: 3,
            last_listened: None,
        });

        let json = buttons.counts_json().unwrap();
        assert_eq!(json, r#"{"listeningCount":49,"sentencesListenedCount":3}"#);

        let parsed = AudioButtons::parse_counts(r#"{"listeningCount":7}"#).unwrap();
        assert_eq!(parsed.listening_count, 7);
        assert_eq!(parsed.sentences_listened_count, 0);

        assert!(matches!(
            AudioButtons::parse_counts("not json"),
            Err(VokabelError::SerializationError(_))
        ));
    }

    #[test]
    fn test_online_click_queues() {
        let pipeline = SpeechPipeline::new(SpeechConfig::default());
        let buttons = AudioButtons::new(Some(pipeline.handle()), SpeechConfig::default());
        let button = AudioButton::new();

        assert!(buttons.host_available());
        // Worker not started: the command waits in the channel
        assert_eq!(buttons.word_clicked("Haus", &button).unwrap(), ClickOutcome::Queued);
        assert!(!buttons.guide_open(&button));
    }
}
