//! # dialogsynth Core
//!
//! Turns generated customer-service transcripts into labeled text files and
//! stitched two-voice audio.
//!
//! A conversation moves through the [`pipeline::Pipeline`]:
//!
//! 1. text is generated from a prompt built for the language, domain and
//!    sentiment ([`prompt`])
//! 2. the text is parsed into alternating agent/customer turns
//!    ([`transcript`], [`labels`])
//! 3. two distinct voices are picked for the language ([`voice`])
//! 4. every turn is synthesized, falling back from the neural to the standard
//!    engine when needed ([`synthesizer`])
//! 5. the segments are joined with short silences into one WAV file
//!    ([`assembler`]) and written next to the transcript ([`output`])
//!
//! Conversations are independent; a failure in one is reported in the
//! [`pipeline::BatchReport`] and never touches the others.

pub mod assembler;
pub mod config;
pub mod conversation;
pub mod error;
pub mod labels;
pub mod output;
pub mod pipeline;
pub mod prompt;
pub mod random;
pub mod retry;
pub mod synthesizer;
pub mod transcript;
pub mod voice;

pub use assembler::{AssemblyError, AudioArtifact, AudioAssembler, SilenceConfig};
pub use config::{Config, PipelineConfig, parse_toml_file, parse_toml_str, validate_config};
pub use conversation::{Conversation, ConversationRequest, ConversationSpec};
pub use error::{ConfigError, PipelineError, Result};
pub use labels::{LabelTable, Speaker, SpeakerLabels};
pub use pipeline::{
    BatchReport, CompletedConversation, ConversationOutcome, ConversationState,
    FailedConversation, Pipeline, RenderedConversation,
};
pub use prompt::{DomainCatalog, SUPPORTED_LANGUAGES, Sentiment};
pub use random::RandomSource;
pub use retry::{RetryConfig, RetryPolicy};
pub use synthesizer::{AudioSegment, TurnSynthesizer};
pub use transcript::{ParseError, Turn, parse_transcript};
pub use voice::{SelectionOptions, VoiceAssignment, select_voices};
