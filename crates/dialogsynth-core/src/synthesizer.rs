//! One utterance in, one audio segment out.

use crate::error::{PipelineError, Result};
use bytes::Bytes;
use dialogsynth_speech::{
    AudioFormat, Engine, SpeechError, SpeechProvider, SynthesisRequest, VoiceProfile, codec,
};
use std::sync::Arc;
use std::time::Duration;

/// Synthesized audio for a single turn
#[derive(Debug, Clone)]
pub struct AudioSegment {
    bytes: Bytes,
    format: AudioFormat,
    duration: Duration,
    voice_id: String,
    engine: Engine,
}

impl AudioSegment {
    /// Wrap provider output, computing its duration from the encoded bytes.
    pub fn new(
        bytes: Bytes,
        format: AudioFormat,
        voice_id: impl Into<String>,
        engine: Engine,
    ) -> codec::CodecResult<Self> {
        let duration = codec::duration_of(&bytes, &format)?;
        Ok(Self {
            bytes,
            format,
            duration,
            voice_id: voice_id.into(),
            engine,
        })
    }

    /// Wrap audio whose duration is already known, e.g. reported by the provider.
    pub fn from_parts(
        bytes: Bytes,
        format: AudioFormat,
        duration: Duration,
        voice_id: impl Into<String>,
        engine: Engine,
    ) -> Self {
        Self {
            bytes,
            format,
            duration,
            voice_id: voice_id.into(),
            engine,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    /// Engine that actually rendered the segment
    pub fn engine(&self) -> Engine {
        self.engine
    }
}

/// Position in the engine fallback sequence.
///
/// `Preferred(Neural)` falls back to `Fallback(Standard)` once; any further
/// rejection is `Exhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAttempt {
    Preferred(Engine),
    Fallback(Engine),
    Exhausted,
}

impl EngineAttempt {
    /// The preferred engine if the voice advertises it, standard otherwise.
    pub fn start(voice: &VoiceProfile, preferred: Engine) -> Self {
        EngineAttempt::Preferred(voice.engine_for(preferred))
    }

    pub fn engine(&self) -> Option<Engine> {
        match self {
            EngineAttempt::Preferred(engine) | EngineAttempt::Fallback(engine) => Some(*engine),
            EngineAttempt::Exhausted => None,
        }
    }

    /// Next state after the provider rejected the current engine.
    pub fn on_rejected(self) -> Self {
        match self {
            EngineAttempt::Preferred(Engine::Neural) => EngineAttempt::Fallback(Engine::Standard),
            EngineAttempt::Preferred(Engine::Standard)
            | EngineAttempt::Fallback(_)
            | EngineAttempt::Exhausted => EngineAttempt::Exhausted,
        }
    }
}

/// Synthesizes turns of one conversation through the speech provider
pub struct TurnSynthesizer {
    provider: Arc<dyn SpeechProvider>,
    language_code: String,
}

impl TurnSynthesizer {
    pub fn new(provider: Arc<dyn SpeechProvider>, language_code: impl Into<String>) -> Self {
        Self {
            provider,
            language_code: language_code.into(),
        }
    }

    /// Synthesize `text` with `voice`.
    ///
    /// Over-long text fails before the provider is called. Transient provider
    /// failures come back as [`PipelineError::ProviderTransient`] for the caller
    /// to retry.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceProfile,
        preferred: Engine,
    ) -> Result<AudioSegment> {
        let length = text.chars().count();
        let max = self.provider.max_input_chars();
        if length > max {
            return Err(PipelineError::UtteranceTooLong { length, max });
        }

        let mut attempt = EngineAttempt::start(voice, preferred);
        while let Some(engine) = attempt.engine() {
            let request = SynthesisRequest::new(text, &voice.id, &self.language_code, engine);
            match self.provider.synthesize(request).await {
                Ok(audio) => {
                    return AudioSegment::new(audio.bytes, audio.format, &voice.id, engine)
                        .map_err(|e| {
                            PipelineError::Speech(SpeechError::ProviderError(format!(
                                "Undecodable audio for voice {}: {}",
                                voice.id, e
                            )))
                        });
                }
                Err(SpeechError::EngineUnsupported { .. }) => {
                    attempt = attempt.on_rejected();
                    match attempt.engine() {
                        Some(next) => log::warn!(
                            "Engine {} rejected for voice {}, retrying with {}",
                            engine,
                            voice.id,
                            next
                        ),
                        None => {
                            return Err(PipelineError::EngineUnsupported {
                                voice_id: voice.id.clone(),
                                engine,
                            });
                        }
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(PipelineError::EngineUnsupported {
            voice_id: voice.id.clone(),
            engine: preferred,
        })
    }
}
