//! # dialogsynth LLM
//!
//! Text-generation backends used to write customer-service transcripts.
//!
//! Every backend implements [`TextGenerator`]: one prompt in, one block of
//! text out. Sampling parameters are fixed when the client is built, either
//! through [`builder::GeneratorBuilder`] or from a [`GenerationConfig`].
//!
//! ## Backends
//!
//! - OpenAI, OpenRouter, DeepSeek and Ollama share the OpenAI-compatible
//!   chat-completions client
//! - Anthropic uses the Messages API

pub mod backends;
pub mod builder;
pub mod config;
pub mod error;

use async_trait::async_trait;

pub use builder::{GeneratorBackend, GeneratorBuilder, from_config};
pub use config::GenerationConfig;
pub use error::{GenerationError, GenerationResult};

/// A backend able to turn a prompt into generated text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable backend name, used in logs
    fn backend_name(&self) -> &str;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    /// Generate a completion for a single user prompt.
    async fn generate(&self, prompt: &str) -> GenerationResult<String>;
}
