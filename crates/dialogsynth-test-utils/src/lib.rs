//! Scripted providers and audio fixtures shared by the dialogsynth test suites.

pub mod audio;
pub mod llm;
pub mod speech;

pub use audio::{neural_voice, standard_voice, tone_pcm16, tone_wav};
pub use llm::MockTextGenerator;
pub use speech::MockSpeechProvider;
