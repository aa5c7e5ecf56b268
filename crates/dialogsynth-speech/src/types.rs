use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumString};

/// Speech synthesis quality tier
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Engine {
    Standard,
    Neural,
}

/// Voice gender as reported by the provider catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Gender {
    Female,
    Male,
    Neutral,
}

/// One voice from a provider's catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Provider voice identifier
    pub id: String,
    /// Display name, when the provider has one distinct from the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Primary language code (BCP-47, e.g. "en-US")
    pub language_code: String,
    /// Further languages the voice can speak
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_language_codes: Vec<String>,
    /// Engines that can render this voice
    pub supported_engines: BTreeSet<Engine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

impl VoiceProfile {
    /// Create a standard-engine voice for a single language
    pub fn new(id: impl Into<String>, language_code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            language_code: language_code.into(),
            additional_language_codes: Vec::new(),
            supported_engines: BTreeSet::from([Engine::Standard]),
            gender: None,
        }
    }

    pub fn with_engines(mut self, engines: impl IntoIterator<Item = Engine>) -> Self {
        self.supported_engines = engines.into_iter().collect();
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_additional_languages<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_language_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn supports(&self, engine: Engine) -> bool {
        self.supported_engines.contains(&engine)
    }

    /// Whether the voice can speak `language_code` (case-insensitive)
    pub fn speaks(&self, language_code: &str) -> bool {
        self.language_code.eq_ignore_ascii_case(language_code)
            || self
                .additional_language_codes
                .iter()
                .any(|code| code.eq_ignore_ascii_case(language_code))
    }

    /// `preferred` if this voice supports it, otherwise standard
    pub fn engine_for(&self, preferred: Engine) -> Engine {
        if self.supports(preferred) {
            preferred
        } else {
            Engine::Standard
        }
    }
}

/// Encoding of synthesized audio bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AudioEncoding {
    /// RIFF/WAVE container
    Wav,
    /// Headerless signed 16-bit little-endian PCM
    Pcm16,
}

/// Format of an encoded audio buffer as reported by the provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub encoding: AudioEncoding,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
}

impl AudioFormat {
    pub fn wav(sample_rate: u32, channels: u16) -> Self {
        Self {
            encoding: AudioEncoding::Wav,
            sample_rate,
            channels,
        }
    }

    pub fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self {
            encoding: AudioEncoding::Pcm16,
            sample_rate,
            channels,
        }
    }
}

/// Speech synthesis request for a single utterance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub language_code: String,
    pub engine: Engine,
}

impl SynthesisRequest {
    pub fn new(
        text: impl Into<String>,
        voice_id: impl Into<String>,
        language_code: impl Into<String>,
        engine: Engine,
    ) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            language_code: language_code.into(),
            engine,
        }
    }
}

/// Encoded audio returned by a provider
#[derive(Clone, Debug)]
pub struct SynthesizedAudio {
    pub bytes: Bytes,
    pub format: AudioFormat,
}
