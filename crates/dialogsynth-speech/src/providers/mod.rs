//! Speech provider implementations

pub mod openai_tts;

pub use openai_tts::{OpenAITts, OpenAITtsConfig};
