//! Generation backend implementations

pub mod anthropic;
pub mod deepseek;
pub mod ollama;
pub mod openai;
pub mod openai_compatible;
pub mod openrouter;
