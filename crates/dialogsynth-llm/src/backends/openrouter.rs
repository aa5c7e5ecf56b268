//! OpenRouter exposes many hosted models behind an OpenAI-compatible API.

use crate::backends::openai_compatible::{OpenAICompatibleProvider, OpenAIProviderConfig};

/// OpenRouter configuration for the OpenAI-compatible provider
pub struct OpenRouterConfig;

impl OpenAIProviderConfig for OpenRouterConfig {
    const PROVIDER_NAME: &'static str = "OpenRouter";
    const DEFAULT_BASE_URL: &'static str = "https://openrouter.ai/api/v1/";
    const DEFAULT_MODEL: &'static str = "anthropic/claude-3.5-sonnet";
}

/// Client for the OpenRouter API
pub type OpenRouter = OpenAICompatibleProvider<OpenRouterConfig>;
