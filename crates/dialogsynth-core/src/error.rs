use crate::assembler::AssemblyError;
use crate::transcript::ParseError;
use dialogsynth_llm::GenerationError;
use dialogsynth_speech::{Engine, SpeechError};
use std::time::Duration;
use thiserror::Error;

/// Everything that can end a conversation early
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("No voices available for language '{language}'")]
    NoVoicesAvailable { language: String },

    #[error("Utterance too long: {length} characters (provider limit {max})")]
    UtteranceTooLong { length: usize, max: usize },

    #[error("Transient provider error: {message}")]
    ProviderTransient {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Engine '{engine}' unsupported for voice '{voice_id}'")]
    EngineUnsupported { voice_id: String, engine: Engine },

    #[error("Generation error: {0}")]
    Generation(GenerationError),

    #[error("Speech error: {0}")]
    Speech(SpeechError),

    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Failed to write artifacts: {0}")]
    Emission(#[from] std::io::Error),
}

impl PipelineError {
    /// Only transient provider failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::ProviderTransient { .. })
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PipelineError::ProviderTransient { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Stable identifier used in batch reports
    pub fn reason_code(&self) -> &'static str {
        match self {
            PipelineError::Parse(err) => err.reason_code(),
            PipelineError::NoVoicesAvailable { .. } => "no_voices_available",
            PipelineError::UtteranceTooLong { .. } => "utterance_too_long",
            PipelineError::ProviderTransient { .. } => "provider_transient",
            PipelineError::EngineUnsupported { .. } => "engine_unsupported",
            PipelineError::Generation(_) => "generation",
            PipelineError::Speech(_) => "speech",
            PipelineError::Assembly(_) => "assembly",
            PipelineError::Emission(_) => "emission",
        }
    }
}

impl From<SpeechError> for PipelineError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::Transient {
                message,
                retry_after,
            } => PipelineError::ProviderTransient {
                message,
                retry_after,
            },
            SpeechError::EngineUnsupported { voice_id, engine } => {
                PipelineError::EngineUnsupported { voice_id, engine }
            }
            SpeechError::TextTooLong { length, max } => {
                PipelineError::UtteranceTooLong { length, max }
            }
            other => PipelineError::Speech(other),
        }
    }
}

impl From<GenerationError> for PipelineError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Transient {
                message,
                retry_after,
            } => PipelineError::ProviderTransient {
                message,
                retry_after,
            },
            other => PipelineError::Generation(other),
        }
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_errors_map_onto_pipeline_taxonomy() {
        let err: PipelineError = SpeechError::Transient {
            message: "429".to_string(),
            retry_after: Some(Duration::from_secs(1)),
        }
        .into();
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(1)));

        let err: PipelineError = SpeechError::TextTooLong {
            length: 5000,
            max: 3000,
        }
        .into();
        assert!(matches!(
            err,
            PipelineError::UtteranceTooLong {
                length: 5000,
                max: 3000
            }
        ));
        assert!(!err.is_retryable());

        let err: PipelineError = SpeechError::VoiceNotFound("x".to_string()).into();
        assert_eq!(err.reason_code(), "speech");
    }

    #[test]
    fn test_generation_errors_map_onto_pipeline_taxonomy() {
        let err: PipelineError = GenerationError::Transient {
            message: "timeout".to_string(),
            retry_after: None,
        }
        .into();
        assert!(err.is_retryable());

        let err: PipelineError = GenerationError::AuthError("bad key".to_string()).into();
        assert!(!err.is_retryable());
        assert_eq!(err.reason_code(), "generation");
    }

    #[test]
    fn test_parse_reason_code_passes_through() {
        let err: PipelineError = ParseError::EmptyInput.into();
        assert_eq!(err.reason_code(), "empty_input");
    }
}
