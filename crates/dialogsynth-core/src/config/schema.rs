use crate::assembler::SilenceConfig;
use crate::labels::SpeakerLabels;
use crate::retry::RetryConfig;
use crate::voice::SelectionOptions;
use dialogsynth_llm::GenerationConfig;
use dialogsynth_speech::Engine;
use dialogsynth_speech::providers::openai_tts::OpenAITtsConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub speech: OpenAITtsConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-language speaker labels, merged over the built-in table
    #[serde(default)]
    pub labels: BTreeMap<String, SpeakerLabels>,

    /// Domain → topics; replaces the built-in catalog when non-empty
    #[serde(default)]
    pub domains: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_max_concurrent_conversations")]
    pub max_concurrent_conversations: usize,

    #[serde(default = "default_max_concurrent_turns")]
    pub max_concurrent_turns: usize,

    #[serde(default = "default_preferred_engine")]
    pub preferred_engine: Engine,

    #[serde(default = "default_true")]
    pub prefer_mixed_gender: bool,

    #[serde(default)]
    pub silence: SilenceConfig,

    /// Output rate in Hz; unset keeps the first segment's rate
    #[serde(default)]
    pub output_sample_rate: Option<u32>,

    /// Seed for voice, topic and silence draws
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_concurrent_conversations() -> usize {
    2
}

fn default_max_concurrent_turns() -> usize {
    4
}

fn default_preferred_engine() -> Engine {
    Engine::Neural
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_conversations: default_max_concurrent_conversations(),
            max_concurrent_turns: default_max_concurrent_turns(),
            preferred_engine: default_preferred_engine(),
            prefer_mixed_gender: default_true(),
            silence: SilenceConfig::default(),
            output_sample_rate: None,
            seed: None,
        }
    }
}

impl PipelineConfig {
    pub fn selection_options(&self) -> SelectionOptions {
        SelectionOptions {
            preferred_engine: self.preferred_engine,
            prefer_mixed_gender: self.prefer_mixed_gender,
        }
    }
}
