//! OpenAI-compatible speech client.
//!
//! Talks to any server exposing the `/audio/speech` endpoint (OpenAI, OpenRouter
//! and self-hosted gateways). Those APIs have no catalog endpoint, so the voice
//! catalog comes from configuration. The standard engine maps to the fast model
//! and the neural engine to the HD model.

use crate::{
    AudioFormat, Engine, Gender, SpeechError, SpeechProvider, SpeechResult,
    SpeechSynthesisProvider, SynthesisRequest, SynthesizedAudio, VoiceCatalogProvider,
    VoiceProfile,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

/// Languages the built-in voices are offered for
const CATALOG_LANGUAGES: &[&str] = &[
    "en-US", "en-GB", "nl-NL", "fr-FR", "de-DE", "it-IT", "pt-PT", "es-ES", "da-DK", "fi-FI",
    "is-IS", "nb-NO", "sv-SE", "pl-PL", "ro-RO", "cy-GB", "ja-JP",
];

const BUILTIN_VOICES: &[(&str, Gender)] = &[
    ("alloy", Gender::Neutral),
    ("ash", Gender::Male),
    ("coral", Gender::Female),
    ("echo", Gender::Male),
    ("fable", Gender::Male),
    ("nova", Gender::Female),
    ("onyx", Gender::Male),
    ("sage", Gender::Female),
    ("shimmer", Gender::Female),
];

/// Configuration for the OpenAI-compatible speech provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAITtsConfig {
    /// API root, e.g. `https://api.openai.com/v1/`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for the standard engine (default: tts-1)
    #[serde(default = "default_standard_model")]
    pub standard_model: String,

    /// Model used for the neural engine (default: tts-1-hd)
    #[serde(default = "default_neural_model")]
    pub neural_model: String,

    /// Request limit in characters (default: 4096)
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Per-request timeout in seconds (default: 60)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Sample rate of the raw PCM the endpoint returns (default: 24000)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Voice catalog; empty means the built-in multilingual voices
    #[serde(default)]
    pub voices: Vec<VoiceProfile>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_standard_model() -> String {
    "tts-1".to_string()
}

fn default_neural_model() -> String {
    "tts-1-hd".to_string()
}

fn default_max_input_chars() -> usize {
    4096
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_sample_rate() -> u32 {
    24_000
}

impl Default for OpenAITtsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            standard_model: default_standard_model(),
            neural_model: default_neural_model(),
            max_input_chars: default_max_input_chars(),
            timeout_seconds: default_timeout_seconds(),
            sample_rate: default_sample_rate(),
            voices: Vec::new(),
        }
    }
}

/// The built-in voices, each offered for every catalog language on both engines.
pub fn default_catalog() -> Vec<VoiceProfile> {
    BUILTIN_VOICES
        .iter()
        .map(|(id, gender)| {
            VoiceProfile::new(*id, CATALOG_LANGUAGES[0])
                .with_additional_languages(CATALOG_LANGUAGES[1..].iter().copied())
                .with_engines([Engine::Standard, Engine::Neural])
                .with_gender(*gender)
        })
        .collect()
}

/// Client for an OpenAI-compatible speech endpoint
pub struct OpenAITts {
    api_key: String,
    config: OpenAITtsConfig,
    catalog: Vec<VoiceProfile>,
    client: reqwest::Client,
}

impl OpenAITts {
    pub fn new(api_key: impl Into<String>, config: OpenAITtsConfig) -> SpeechResult<Self> {
        if config.sample_rate == 0 {
            return Err(SpeechError::InvalidConfiguration(
                "sample_rate must be greater than zero".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SpeechError::InvalidConfiguration(e.to_string()))?;

        let catalog = if config.voices.is_empty() {
            default_catalog()
        } else {
            config.voices.clone()
        };

        Ok(Self {
            api_key: api_key.into(),
            config,
            catalog,
            client,
        })
    }

    pub fn config(&self) -> &OpenAITtsConfig {
        &self.config
    }

    fn model_for(&self, engine: Engine) -> &str {
        match engine {
            Engine::Standard => &self.config.standard_model,
            Engine::Neural => &self.config.neural_model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.config.base_url.trim_end_matches('/'))
    }

    fn find_voice(&self, voice_id: &str) -> SpeechResult<&VoiceProfile> {
        self.catalog
            .iter()
            .find(|voice| voice.id == voice_id)
            .ok_or_else(|| SpeechError::VoiceNotFound(voice_id.to_string()))
    }
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Map a non-success response onto the speech error taxonomy.
fn classify_failure(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
    request: &SynthesisRequest,
) -> SpeechError {
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        return SpeechError::Transient {
            message: format!("{status}: {body}"),
            retry_after,
        };
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return SpeechError::AuthError(format!("{status}: {body}"));
    }

    if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
        let rejected = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error.param);
        match rejected.as_deref() {
            Some("model") => {
                return SpeechError::EngineUnsupported {
                    voice_id: request.voice_id.clone(),
                    engine: request.engine,
                };
            }
            Some("voice") => return SpeechError::VoiceNotFound(request.voice_id.clone()),
            _ => {}
        }
    }

    SpeechError::ProviderError(format!("{status}: {body}"))
}

/// `{"error": {"message": .., "param": ..}}` body of a rejected request
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    /// Request field the server rejected
    #[serde(default)]
    param: Option<String>,
}

impl SpeechProvider for OpenAITts {
    fn provider_name(&self) -> &str {
        "openai-tts"
    }
}

#[async_trait]
impl VoiceCatalogProvider for OpenAITts {
    async fn list_voices(&self, language_code: &str) -> SpeechResult<Vec<VoiceProfile>> {
        Ok(self
            .catalog
            .iter()
            .filter(|voice| voice.speaks(language_code))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SpeechSynthesisProvider for OpenAITts {
    async fn synthesize(&self, request: SynthesisRequest) -> SpeechResult<SynthesizedAudio> {
        if self.api_key.is_empty() {
            return Err(SpeechError::AuthError(
                "Missing speech provider API key".to_string(),
            ));
        }

        let voice = self.find_voice(&request.voice_id)?;
        if !voice.supports(request.engine) {
            return Err(SpeechError::EngineUnsupported {
                voice_id: request.voice_id.clone(),
                engine: request.engine,
            });
        }

        let length = request.text.chars().count();
        if length > self.config.max_input_chars {
            return Err(SpeechError::TextTooLong {
                length,
                max: self.config.max_input_chars,
            });
        }

        let body = json!({
            "model": self.model_for(request.engine),
            "input": request.text,
            "voice": request.voice_id,
            "response_format": "pcm",
        });

        log::debug!(
            "Synthesizing {} chars with voice {} ({})",
            length,
            request.voice_id,
            request.engine
        );

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(resp.headers());
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_failure(status, retry_after, &text, &request));
        }

        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(SpeechError::ProviderError(
                "Provider returned an empty audio stream".to_string(),
            ));
        }

        Ok(SynthesizedAudio {
            bytes,
            format: AudioFormat::pcm16(self.config.sample_rate, 1),
        })
    }

    fn max_input_chars(&self) -> usize {
        self.config.max_input_chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(engine: Engine) -> SynthesisRequest {
        SynthesisRequest::new("Hello", "nova", "en-US", engine)
    }

    #[test]
    fn test_default_config() {
        let config = OpenAITtsConfig::default();
        assert_eq!(config.standard_model, "tts-1");
        assert_eq!(config.neural_model, "tts-1-hd");
        assert_eq!(config.max_input_chars, 4096);
        assert!(config.voices.is_empty());
    }

    #[test]
    fn test_default_catalog_is_multilingual() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), BUILTIN_VOICES.len());
        assert!(catalog.iter().all(|v| v.speaks("ja-JP") && v.speaks("cy-GB")));
        assert!(catalog.iter().all(|v| v.supports(Engine::Neural)));
    }

    #[test]
    fn test_classify_rate_limit_is_transient() {
        let err = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(2)),
            "slow down",
            &request(Engine::Neural),
        );
        match err {
            SpeechError::Transient { retry_after, .. } => {
                assert_eq!(retry_after, Some(Duration::from_secs(2)))
            }
            other => panic!("Expected Transient, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_model_rejection_as_engine_unsupported() {
        let err = classify_failure(
            StatusCode::NOT_FOUND,
            None,
            r#"{"error":{"message":"The model `tts-1-hd` does not exist","type":"invalid_request_error","param":"model","code":"model_not_found"}}"#,
            &request(Engine::Neural),
        );
        assert!(matches!(
            err,
            SpeechError::EngineUnsupported {
                engine: Engine::Neural,
                ..
            }
        ));
    }

    #[test]
    fn test_classify_only_trusts_the_rejected_param() {
        let mentions_model = classify_failure(
            StatusCode::BAD_REQUEST,
            None,
            r#"{"error":{"message":"input rejected by the moderation model","type":"invalid_request_error","param":"input","code":null}}"#,
            &request(Engine::Neural),
        );
        assert!(matches!(mentions_model, SpeechError::ProviderError(_)));

        let unstructured = classify_failure(
            StatusCode::BAD_REQUEST,
            None,
            "model overloaded",
            &request(Engine::Neural),
        );
        assert!(matches!(unstructured, SpeechError::ProviderError(_)));

        let voice = classify_failure(
            StatusCode::BAD_REQUEST,
            None,
            r#"{"error":{"message":"Invalid voice","param":"voice"}}"#,
            &request(Engine::Standard),
        );
        assert!(matches!(voice, SpeechError::VoiceNotFound(ref id) if id == "nova"));
    }

    #[test]
    fn test_classify_auth() {
        let err = classify_failure(StatusCode::UNAUTHORIZED, None, "", &request(Engine::Standard));
        assert!(matches!(err, SpeechError::AuthError(_)));
    }
}
