use crate::{SpeechResult, SynthesisRequest, SynthesizedAudio, VoiceProfile};
use async_trait::async_trait;

/// Marker Trait for speech providers
///
/// This trait combines all speech capabilities into a single provider interface.
/// Providers implement this marker trait along with the specific capability traits.
/// Implementations are shared across concurrent conversations, so calls must not
/// mutate session or credential state.
pub trait SpeechProvider: SpeechSynthesisProvider + VoiceCatalogProvider + Send + Sync {
    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// Trait for speech synthesis capabilities
#[async_trait]
pub trait SpeechSynthesisProvider: Send + Sync {
    /// Synthesize exactly `request.text` with exactly `request.voice_id`.
    ///
    /// # Errors
    /// * `SpeechError::EngineUnsupported` when the voice cannot be rendered with
    ///   the requested engine
    /// * `SpeechError::Transient` for rate limiting, timeouts and server errors
    async fn synthesize(&self, request: SynthesisRequest) -> SpeechResult<SynthesizedAudio>;

    /// Longest utterance (in characters) a single request may carry
    fn max_input_chars(&self) -> usize {
        3000
    }
}

/// Trait for voice catalog capabilities
#[async_trait]
pub trait VoiceCatalogProvider: Send + Sync {
    /// List the voices that can speak `language_code`
    async fn list_voices(&self, language_code: &str) -> SpeechResult<Vec<VoiceProfile>>;
}
