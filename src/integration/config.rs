//! Configuration for speech playback
//!
//! All delays are tuning constants, not contracts. They are exposed as named
//! defaults and can be overridden per instance. The word and sentence voice
//! profiles are fixed and live in [`crate::speech::voice`].

use crate::speech::voice::DEFAULT_LANGUAGE;
use crate::{Result, VokabelError};
use std::time::Duration;

/// Pause after a request completes or fails before the next one is activated
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// How long a control stays highlighted after activation
pub const FLASH_DURATION: Duration = Duration::from_millis(500);

/// How long the error glyph is shown before reverting to ready
pub const ERROR_GLYPH_DURATION: Duration = Duration::from_millis(1500);

/// How long a pronunciation guide stays open
pub const GUIDE_DURATION: Duration = Duration::from_secs(10);

/// Wait before looking for a German voice again when none was listed at startup
pub const VOICE_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Bound of the command channel into the speech worker
pub const QUEUE_SIZE: usize = 100;

/// Configuration for the speech scheduler and its call sites
#[derive(Clone, Debug)]
pub struct SpeechConfig {
    pub settle_delay: Duration,

    pub flash_duration: Duration,

    pub error_glyph_duration: Duration,

    pub guide_duration: Duration,

    /// Language used when no German voice is found
    pub language: String,

    pub voice_retry_delay: Duration,

    /// Fail an active utterance that never reports back.
    /// `None` waits indefinitely.
    pub utterance_timeout: Option<Duration>,

    /// Maximum number of in-flight commands to the worker
    pub queue_size: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            settle_delay: SETTLE_DELAY,
            flash_duration: FLASH_DURATION,
            error_glyph_duration: ERROR_GLYPH_DURATION,
            guide_duration: GUIDE_DURATION,
            language: DEFAULT_LANGUAGE.to_string(),
            voice_retry_delay: VOICE_RETRY_DELAY,
            utterance_timeout: None,
            queue_size: QUEUE_SIZE,
        }
    }
}

impl SpeechConfig {
    /// Set the gap between consecutive utterances
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the activation flash duration
    pub fn with_flash_duration(mut self, duration: Duration) -> Self {
        self.flash_duration = duration;
        self
    }

    /// Set how long the error glyph is shown
    pub fn with_error_glyph_duration(mut self, duration: Duration) -> Self {
        self.error_glyph_duration = duration;
        self
    }

    /// Set how long pronunciation guides stay open
    pub fn with_guide_duration(mut self, duration: Duration) -> Self {
        self.guide_duration = duration;
        self
    }

    /// Set the fallback language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Enable the watchdog for utterances that never report back
    pub fn with_utterance_timeout(mut self, timeout: Duration) -> Self {
        self.utterance_timeout = Some(timeout);
        self
    }

    /// Set the command channel bound
    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    /// Set the delay before the one-off voice list retry
    pub fn with_voice_retry_delay(mut self, delay: Duration) -> Self {
        self.voice_retry_delay = delay;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(VokabelError::ConfigError("Language is required".into()));
        }

        if self.utterance_timeout == Some(Duration::ZERO) {
            return Err(VokabelError::ConfigError(
                "Utterance timeout must be non-zero".into(),
            ));
        }

        if self.queue_size == 0 {
            return Err(VokabelError::ConfigError("Queue size must be non-zero".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SpeechConfig::default();
        assert_eq!(config.settle_delay, Duration::from_millis(100));
        assert_eq!(config.flash_duration, Duration::from_millis(500));
        assert_eq!(config.error_glyph_duration, Duration::from_millis(1500));
        assert_eq!(config.language, "de-DE");
        assert_eq!(config.voice_retry_delay, Duration::from_millis(1000));
        assert!(config.utterance_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SpeechConfig::default()
            .with_settle_delay(Duration::from_millis(5))
            .with_utterance_timeout(Duration::from_secs(30))
            .with_language("de-AT");

        assert_eq!(config.settle_delay, Duration::from_millis(5));
        assert_eq!(config.utterance_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.language, "de-AT");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SpeechConfig::default().with_language(" ").validate().is_err());
        assert!(SpeechConfig::default()
            .with_utterance_timeout(Duration::ZERO)
            .validate()
            .is_err());
        assert!(matches!(
            SpeechConfig::default().with_queue_size(0).validate(),
            Err(VokabelError::ConfigError(_))
        ));
    }
}
