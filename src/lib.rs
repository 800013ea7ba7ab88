pub mod integration;
pub mod speech;
pub mod utils;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VokabelError {
    #[error("Speech synthesis is not available on this host")]
    HostUnavailable,

    #[error("Utterance failed: {0}")]
    UtteranceFailed(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for VokabelError {
    fn from(e: serde_json::Error) -> Self {
        VokabelError::SerializationError(e.to_string())
    }
}

impl VokabelError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The host will not grow a speech engine mid-session
            VokabelError::HostUnavailable => false,
            // The next queued request proceeds normally
            VokabelError::UtteranceFailed(_) => true,
            // The worker thread is gone
            VokabelError::ChannelError(_) => false,
            VokabelError::ConfigError(_) => false,
            VokabelError::SerializationError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            VokabelError::HostUnavailable => {
                "Audio is not supported here. A pronunciation guide is shown instead.".to_string()
            }
            VokabelError::UtteranceFailed(_) => {
                "Pronunciation playback failed. Please try again.".to_string()
            }
            VokabelError::ChannelError(_) => {
                "Internal communication error. Please reload the trainer.".to_string()
            }
            VokabelError::ConfigError(_) => {
                "Configuration error. Please check speech settings.".to_string()
            }
            VokabelError::SerializationError(_) => {
                "Saved listening progress could not be read.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, VokabelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_recoverability() {
        assert!(VokabelError::UtteranceFailed("synthesis-failed".into()).is_recoverable());
        assert!(!VokabelError::HostUnavailable.is_recoverable());
        assert!(!VokabelError::ChannelError("closed".into()).is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = VokabelError::UtteranceFailed("interrupted".into());
        assert_eq!(err.to_string(), "Utterance failed: interrupted");
        assert!(err.user_message().contains("try again"));
    }
}
