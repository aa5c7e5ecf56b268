//! Shared client for backends speaking the OpenAI chat-completions protocol.
//!
//! Each backend supplies an [`OpenAIProviderConfig`] with its name and
//! defaults, and gets a full [`TextGenerator`] from [`OpenAICompatibleProvider`].

use crate::{
    TextGenerator,
    error::{GenerationError, GenerationResult, parse_retry_after},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{marker::PhantomData, time::Duration};

/// Static description of an OpenAI-compatible backend
pub trait OpenAIProviderConfig: Send + Sync + 'static {
    const PROVIDER_NAME: &'static str;
    const DEFAULT_BASE_URL: &'static str;
    const DEFAULT_MODEL: &'static str;
    const REQUIRES_API_KEY: bool = true;
}

/// Generic chat-completions client
pub struct OpenAICompatibleProvider<T: OpenAIProviderConfig> {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_seconds: Option<u64>,
    client: reqwest::Client,
    _config: PhantomData<T>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl<T: OpenAIProviderConfig> OpenAICompatibleProvider<T> {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        timeout_seconds: Option<u64>,
        top_p: Option<f32>,
    ) -> GenerationResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(sec));
        }
        let client = builder
            .build()
            .map_err(|e| GenerationError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| T::DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| T::DEFAULT_MODEL.to_string()),
            max_tokens,
            temperature,
            top_p,
            timeout_seconds,
            client,
            _config: PhantomData,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl<T: OpenAIProviderConfig> TextGenerator for OpenAICompatibleProvider<T> {
    fn backend_name(&self) -> &str {
        T::PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> GenerationResult<String> {
        if T::REQUIRES_API_KEY && self.api_key.is_empty() {
            return Err(GenerationError::AuthError(format!(
                "Missing {} API key",
                T::PROVIDER_NAME
            )));
        }

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            stream: false,
        };

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("{} request payload: {}", T::PROVIDER_NAME, json);
            }
        }

        let mut request = self.client.post(self.endpoint()).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let resp = request.send().await?;
        log::debug!("{} HTTP status: {}", T::PROVIDER_NAME, resp.status());

        let status = resp.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(resp.headers());
            let error_text = resp.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(
                T::PROVIDER_NAME,
                status,
                retry_after,
                &error_text,
            ));
        }

        let text = resp.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&text)?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            log::warn!("{} returned an empty completion", T::PROVIDER_NAME);
        }
        Ok(content)
    }
}
