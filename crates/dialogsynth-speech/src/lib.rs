//! # dialogsynth Speech
//!
//! Speech provider abstractions for dialogsynth.
//!
//! This crate defines the seam between the dialogue pipeline and an external
//! text-to-speech service, plus the audio codec helpers the pipeline needs to
//! stitch per-turn audio into one file.
//!
//! ## Architecture
//!
//! - `SpeechProvider`: Marker trait combining all speech capabilities
//! - `SpeechSynthesisProvider`: Turns one utterance into encoded audio
//! - `VoiceCatalogProvider`: Lists the voices available for a language
//!
//! ## Providers
//!
//! - `providers::openai_tts`: OpenAI-compatible `/audio/speech` endpoint with a
//!   configured voice catalog
//!
//! ## Example
//!
//! ```rust,ignore
//! use dialogsynth_speech::{Engine, SpeechProvider, SynthesisRequest};
//!
//! async fn speak(provider: &dyn SpeechProvider, text: &str) {
//!     let voices = provider.list_voices("en-US").await.unwrap();
//!     let request = SynthesisRequest::new(text, &voices[0].id, "en-US", Engine::Neural);
//!     let audio = provider.synthesize(request).await.unwrap();
//!     println!("{} bytes of {:?}", audio.bytes.len(), audio.format.encoding);
//! }
//! ```

pub mod codec;
pub mod error;
mod provider;
pub mod types;

// Provider implementations
pub mod providers;

pub use codec::{CodecError, CodecResult, DecodedAudio};
pub use error::{SpeechError, SpeechResult};
pub use provider::{SpeechProvider, SpeechSynthesisProvider, VoiceCatalogProvider};
pub use types::{
    AudioEncoding, AudioFormat, Engine, Gender, SynthesisRequest, SynthesizedAudio, VoiceProfile,
};
