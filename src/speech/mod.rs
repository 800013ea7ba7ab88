//! Pronunciation playback
//!
//! This module provides:
//! - A serial scheduler that owns the single active utterance slot
//! - The host text-to-speech boundary and voice selection
//! - A worker thread and cloneable handle for click handlers

pub mod control;
pub mod engine;
pub mod pipeline;
pub mod request;
pub mod scheduler;
pub mod voice;

// Re-export commonly used types
pub use control::{AudioButton, ButtonState, ControlHandle, Glyph, PlaybackControl};
pub use engine::{
    EngineReport, SimulatedEngine, SpeechEngine, Utterance, UtteranceEvent, UtteranceSink,
};
pub use pipeline::{SchedulerStatus, SpeechCommand, SpeechHandle, SpeechPipeline};
pub use request::{RequestId, RequestKind, SpeechRequest};
pub use scheduler::{SchedulerState, SchedulerStats, SpeechEvent, SpeechScheduler};
pub use voice::{select_german_voice, VoiceInfo, VoiceProfile, SENTENCE_PROFILE, WORD_PROFILE};
