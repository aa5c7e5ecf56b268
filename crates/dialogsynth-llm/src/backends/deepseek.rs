//! DeepSeek uses an OpenAI-compatible API.

use crate::backends::openai_compatible::{OpenAICompatibleProvider, OpenAIProviderConfig};

/// DeepSeek configuration for the OpenAI-compatible provider
pub struct DeepSeekConfig;

impl OpenAIProviderConfig for DeepSeekConfig {
    const PROVIDER_NAME: &'static str = "DeepSeek";
    const DEFAULT_BASE_URL: &'static str = "https://api.deepseek.com/v1/";
    const DEFAULT_MODEL: &'static str = "deepseek-chat";
}

/// Client for the DeepSeek API
pub type DeepSeek = OpenAICompatibleProvider<DeepSeekConfig>;
