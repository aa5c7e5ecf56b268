use crate::Engine;
use std::time::Duration;
use thiserror::Error;

/// Speech-provider errors
#[derive(Error, Debug)]
pub enum SpeechError {
    /// Rate limiting, timeouts, connection failures and server errors
    #[error("Transient speech provider error: {message}")]
    Transient {
        message: String,
        retry_after: Option<Duration>,
    },

    /// The provider cannot render this voice with this engine
    #[error("Engine '{engine}' is not supported for voice '{voice_id}'")]
    EngineUnsupported { voice_id: String, engine: Engine },

    /// Voice not found
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// Utterance exceeds the provider's request limit
    #[error("Text too long: {length} characters (provider limit {max})")]
    TextTooLong { length: usize, max: usize },

    /// Authentication or credential problem
    #[error("Speech provider authentication error: {0}")]
    AuthError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Provider-specific error
    #[error("Speech provider error: {0}")]
    ProviderError(String),
}

impl SpeechError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, SpeechError::Transient { .. })
    }
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            SpeechError::transient(err.to_string())
        } else {
            SpeechError::ProviderError(err.to_string())
        }
    }
}

/// Result type for speech operations
pub type SpeechResult<T> = Result<T, SpeechError>;
