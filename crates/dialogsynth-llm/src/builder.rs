//! Builder module for configuring and instantiating text generators.

use crate::{
    GenerationConfig, TextGenerator,
    backends::{
        anthropic::Anthropic,
        deepseek::DeepSeek,
        ollama::Ollama,
        openai::OpenAI,
        openai_compatible::{OpenAICompatibleProvider, OpenAIProviderConfig},
        openrouter::OpenRouter,
    },
    error::{GenerationError, GenerationResult},
};
use serde::{Deserialize, Serialize};
use std::{marker::PhantomData, sync::Arc};

/// Supported generation backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GeneratorBackend {
    /// OpenAI chat completions
    #[default]
    OpenAI,
    /// Anthropic Messages API
    Anthropic,
    /// OpenRouter, routing to many hosted models
    OpenRouter,
    /// DeepSeek chat completions
    DeepSeek,
    /// Local Ollama server through its OpenAI-compatible endpoint
    Ollama,
}

impl GeneratorBackend {
    /// Environment variable conventionally holding this backend's API key.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            GeneratorBackend::OpenAI => Some("OPENAI_API_KEY"),
            GeneratorBackend::Anthropic => Some("ANTHROPIC_API_KEY"),
            GeneratorBackend::OpenRouter => Some("OPENROUTER_API_KEY"),
            GeneratorBackend::DeepSeek => Some("DEEPSEEK_API_KEY"),
            GeneratorBackend::Ollama => None,
        }
    }
}

/// Case-insensitive backend parsing.
///
/// ```
/// use std::str::FromStr;
/// use dialogsynth_llm::GeneratorBackend;
///
/// let backend = GeneratorBackend::from_str("Anthropic").unwrap();
/// assert_eq!(backend, GeneratorBackend::Anthropic);
///
/// let err = GeneratorBackend::from_str("bedrock").unwrap_err();
/// assert!(err.to_string().contains("Unknown generation backend"));
/// ```
impl std::str::FromStr for GeneratorBackend {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(GeneratorBackend::OpenAI),
            "anthropic" => Ok(GeneratorBackend::Anthropic),
            "openrouter" => Ok(GeneratorBackend::OpenRouter),
            "deepseek" => Ok(GeneratorBackend::DeepSeek),
            "ollama" => Ok(GeneratorBackend::Ollama),
            _ => Err(GenerationError::InvalidRequest(format!(
                "Unknown generation backend: {s}"
            ))),
        }
    }
}

/// Builder for configuring and instantiating a text generator.
pub struct GeneratorBuilder<G: TextGenerator> {
    pub(crate) backend: PhantomData<G>,
    /// API key for authentication with the backend
    pub(crate) api_key: Option<String>,
    /// Base URL for API requests
    pub(crate) base_url: Option<String>,
    /// Model identifier to use
    pub model: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Request timeout in seconds
    pub(crate) timeout_seconds: Option<u64>,
    /// Top-p (nucleus) sampling parameter
    pub top_p: Option<f32>,
}

impl<G: TextGenerator> Default for GeneratorBuilder<G> {
    fn default() -> Self {
        Self {
            backend: PhantomData,
            api_key: None,
            base_url: None,
            model: None,
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
            top_p: None,
        }
    }
}

impl<G: TextGenerator> GeneratorBuilder<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key for authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL for API requests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Copy every setting from a [`GenerationConfig`] onto the builder.
    pub fn from_config(config: &GenerationConfig) -> Self {
        let mut builder = Self::new()
            .max_tokens(config.max_tokens)
            .temperature(config.temperature)
            .top_p(config.top_p)
            .timeout_seconds(config.timeout_seconds);
        builder.model = config.model.clone();
        builder.base_url = config.base_url.clone();
        builder
    }
}

impl<C: OpenAIProviderConfig> GeneratorBuilder<OpenAICompatibleProvider<C>> {
    pub fn build(self) -> GenerationResult<Arc<OpenAICompatibleProvider<C>>> {
        let api_key = match self.api_key {
            Some(key) => key,
            None if !C::REQUIRES_API_KEY => String::new(),
            None => {
                return Err(GenerationError::InvalidRequest(format!(
                    "No API key provided for {}",
                    C::PROVIDER_NAME
                )));
            }
        };

        let provider = OpenAICompatibleProvider::new(
            api_key,
            self.base_url,
            self.model,
            self.max_tokens,
            self.temperature,
            self.timeout_seconds,
            self.top_p,
        )?;
        Ok(Arc::new(provider))
    }
}

impl GeneratorBuilder<Anthropic> {
    pub fn build(self) -> GenerationResult<Arc<Anthropic>> {
        let api_key = self.api_key.ok_or_else(|| {
            GenerationError::InvalidRequest("No API key provided for Anthropic".to_string())
        })?;

        let provider = Anthropic::new(
            api_key,
            self.base_url,
            self.model,
            self.max_tokens,
            self.temperature,
            self.timeout_seconds,
            self.top_p,
        )?;
        Ok(Arc::new(provider))
    }
}

fn with_key<G: TextGenerator>(
    builder: GeneratorBuilder<G>,
    api_key: Option<String>,
) -> GeneratorBuilder<G> {
    match api_key {
        Some(key) => builder.api_key(key),
        None => builder,
    }
}

/// Build the backend named in `config`.
pub fn from_config(
    config: &GenerationConfig,
    api_key: Option<String>,
) -> GenerationResult<Arc<dyn TextGenerator>> {
    config
        .validate()
        .map_err(GenerationError::InvalidRequest)?;

    let generator: Arc<dyn TextGenerator> = match config.backend {
        GeneratorBackend::OpenAI => {
            with_key(GeneratorBuilder::<OpenAI>::from_config(config), api_key).build()?
        }
        GeneratorBackend::Anthropic => {
            with_key(GeneratorBuilder::<Anthropic>::from_config(config), api_key).build()?
        }
        GeneratorBackend::OpenRouter => {
            with_key(GeneratorBuilder::<OpenRouter>::from_config(config), api_key).build()?
        }
        GeneratorBackend::DeepSeek => {
            with_key(GeneratorBuilder::<DeepSeek>::from_config(config), api_key).build()?
        }
        GeneratorBackend::Ollama => {
            with_key(GeneratorBuilder::<Ollama>::from_config(config), api_key).build()?
        }
    };

    log::info!(
        "Using {} generation backend with model {}",
        generator.backend_name(),
        generator.model()
    );
    Ok(generator)
}
