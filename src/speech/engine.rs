//! Host text-to-speech boundary
//!
//! The host engine plays one utterance at a time and reports progress
//! asynchronously through an [`UtteranceSink`]. Exactly one terminal event
//! (`Completed` or `Failed`) is expected per accepted utterance.

use super::request::RequestId;
use super::voice::{VoiceInfo, VoiceProfile};
use crate::Result;
use crossbeam_channel::Sender;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// One unit of text submitted to the host engine
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub request_id: RequestId,

    pub text: String,

    /// Language tag, taken from the selected voice when there is one
    pub lang: String,

    /// Name of the host voice to use, if a German voice was found
    pub voice: Option<String>,

    pub profile: VoiceProfile,
}

/// Progress of an utterance as reported by the host engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UtteranceEvent {
    /// Audio started playing
    Started,

    /// Playback finished successfully
    Completed,

    /// Playback failed (engine busy, denied, interrupted, ...)
    Failed(String),
}

impl UtteranceEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UtteranceEvent::Started)
    }
}

/// An engine event tagged with the request it belongs to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineReport {
    pub request_id: RequestId,
    pub event: UtteranceEvent,
}

/// Completion channel handed to the engine with each utterance
#[derive(Clone, Debug)]
pub struct UtteranceSink {
    request_id: RequestId,
    tx: Sender<EngineReport>,
}

impl UtteranceSink {
    pub fn new(request_id: RequestId, tx: Sender<EngineReport>) -> Self {
        Self { request_id, tx }
    }

    /// Report progress; a scheduler that has shut down is ignored
    pub fn send(&self, event: UtteranceEvent) {
        if self
            .tx
            .send(EngineReport {
                request_id: self.request_id,
                event,
            })
            .is_err()
        {
            debug!("Dropping engine event for {}: scheduler gone", self.request_id);
        }
    }

    pub fn started(&self) {
        self.send(UtteranceEvent::Started);
    }

    pub fn completed(&self) {
        self.send(UtteranceEvent::Completed);
    }

    pub fn failed(&self, reason: impl Into<String>) {
        self.send(UtteranceEvent::Failed(reason.into()));
    }
}

/// Host text-to-speech capability
pub trait SpeechEngine: Send + Sync {
    /// Voices currently offered by the host
    fn voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }

    /// Start vocalizing `utterance` and return immediately
    ///
    /// Progress is reported through `sink`. An `Err` means the engine
    /// rejected the utterance outright and no events will follow.
    fn speak(&self, utterance: Utterance, sink: UtteranceSink) -> Result<()>;
}

/// Engine that pretends to speak by sleeping, used by the demo binary
pub struct SimulatedEngine {
    per_char: Duration,
    voices: Vec<VoiceInfo>,
}

impl SimulatedEngine {
    pub fn new(per_char: Duration) -> Self {
        Self {
            per_char,
            voices: vec![VoiceInfo::new("Simulated Deutsch", "de-DE", true)],
        }
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new(Duration::from_millis(60))
    }
}

impl SpeechEngine for SimulatedEngine {
    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    fn speak(&self, utterance: Utterance, sink: UtteranceSink) -> Result<()> {
        let duration = self.per_char * utterance.text.chars().count() as u32;
        thread::spawn(move || {
            sink.started();
            info!(
                "🔊 [{} rate={} pitch={}] {}",
                utterance.voice.as_deref().unwrap_or(&utterance.lang),
                utterance.profile.rate,
                utterance.profile.pitch,
                utterance.text
            );
            thread::sleep(duration);
            sink.completed();
        });
        Ok(())
    }
}
