use crate::builder::GeneratorBackend;
use serde::{Deserialize, Serialize};

/// Settings for the transcript-generation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Backend to talk to (default: openai)
    #[serde(default)]
    pub backend: GeneratorBackend,

    /// Model override; each backend has its own default
    #[serde(default)]
    pub model: Option<String>,

    /// API root override, e.g. a proxy or a local gateway
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Per-request timeout in seconds (default: 120)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_timeout_seconds() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: GeneratorBackend::default(),
            model: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl GenerationConfig {
    /// Reject sampling parameters no backend accepts.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than zero".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) || self.top_p == 0.0 {
            return Err(format!("top_p must be within (0.0, 1.0], got {}", self.top_p));
        }
        if self.timeout_seconds == 0 {
            return Err("timeout_seconds must be greater than zero".to_string());
        }
        Ok(())
    }
}
