//! Local Ollama server through its `/v1` compatibility layer.

use crate::backends::openai_compatible::{OpenAICompatibleProvider, OpenAIProviderConfig};

pub struct OllamaConfig;

impl OpenAIProviderConfig for OllamaConfig {
    const PROVIDER_NAME: &'static str = "Ollama";
    const DEFAULT_BASE_URL: &'static str = "http://localhost:11434/v1/";
    const DEFAULT_MODEL: &'static str = "llama3.1";
    const REQUIRES_API_KEY: bool = false;
}

pub type Ollama = OpenAICompatibleProvider<OllamaConfig>;
