//! Call-site glue between UI click handlers and the speech worker

pub mod buttons;
pub mod config;

pub use buttons::{
    AudioButtons, ClickOutcome, ListeningCounts, ListeningTracker, PronunciationGuide,
};
pub use config::SpeechConfig;
