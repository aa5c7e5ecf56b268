//! OpenAI chat completions.

use crate::backends::openai_compatible::{OpenAICompatibleProvider, OpenAIProviderConfig};

/// OpenAI configuration for the OpenAI-compatible provider
pub struct OpenAIConfig;

impl OpenAIProviderConfig for OpenAIConfig {
    const PROVIDER_NAME: &'static str = "OpenAI";
    const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1/";
    const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
}

/// Client for the OpenAI API
pub type OpenAI = OpenAICompatibleProvider<OpenAIConfig>;
