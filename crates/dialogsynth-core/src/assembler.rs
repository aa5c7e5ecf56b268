//! Stitching per-turn audio into one WAV file.

use crate::random::RandomSource;
use crate::synthesizer::AudioSegment;
use dialogsynth_speech::codec::{self, CodecError, DecodedAudio};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("No audio segments to assemble")]
    NoSegments,

    #[error("Audio for turn {index} is missing")]
    MissingSegment { index: usize },

    #[error("Audio for turn {index} could not be decoded: {source}")]
    CorruptSegment {
        index: usize,
        #[source]
        source: CodecError,
    },

    #[error("Failed to encode output audio: {0}")]
    Encode(#[source] CodecError),
}

/// Pause inserted between adjacent turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilenceConfig {
    #[serde(default = "default_min_ms")]
    pub min_ms: u64,
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

fn default_min_ms() -> u64 {
    300
}

fn default_max_ms() -> u64 {
    800
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            min_ms: default_min_ms(),
            max_ms: default_max_ms(),
        }
    }
}

impl SilenceConfig {
    /// Upper bound for any configured pause
    pub const MAX_MS: u64 = 5_000;

    pub fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_ms > self.max_ms {
            return Err(format!(
                "silence min_ms ({}) exceeds max_ms ({})",
                self.min_ms, self.max_ms
            ));
        }
        if self.max_ms > Self::MAX_MS {
            return Err(format!(
                "silence max_ms ({}) exceeds {} ms",
                self.max_ms,
                Self::MAX_MS
            ));
        }
        Ok(())
    }

    /// Fixed when min == max, uniform in the range otherwise.
    pub fn draw(&self, rng: &RandomSource) -> Duration {
        Duration::from_millis(rng.between(self.min_ms, self.max_ms))
    }
}

/// Final stitched audio of one conversation
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    bytes: Vec<u8>,
    sample_rate: u32,
    channels: u16,
    duration: Duration,
    silences: Vec<Duration>,
}

impl AudioArtifact {
    /// 16-bit PCM WAV bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Pauses inserted between turns, in order
    pub fn silences(&self) -> &[Duration] {
        &self.silences
    }
}

/// Concatenates decoded segments with silence between adjacent turns
#[derive(Debug, Clone)]
pub struct AudioAssembler {
    silence: SilenceConfig,
    output_sample_rate: Option<u32>,
}

impl AudioAssembler {
    /// `output_sample_rate` of `None` keeps the first segment's rate.
    pub fn new(silence: SilenceConfig, output_sample_rate: Option<u32>) -> Self {
        Self {
            silence,
            output_sample_rate,
        }
    }

    /// Assemble segments aligned 1:1 with turns.
    ///
    /// Any missing or undecodable segment fails the whole assembly; nothing
    /// partial is returned.
    pub fn assemble(
        &self,
        segments: &[Option<AudioSegment>],
        rng: &RandomSource,
    ) -> Result<AudioArtifact, AssemblyError> {
        if segments.is_empty() {
            return Err(AssemblyError::NoSegments);
        }

        let present: Vec<&AudioSegment> = segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                segment
                    .as_ref()
                    .ok_or(AssemblyError::MissingSegment { index })
            })
            .collect::<Result<_, _>>()?;

        let decoded: Vec<DecodedAudio> = present
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                codec::decode(segment.bytes(), segment.format())
                    .map_err(|source| AssemblyError::CorruptSegment { index, source })
            })
            .collect::<Result<_, _>>()?;

        let sample_rate = match self.output_sample_rate {
            Some(rate) => rate,
            None => decoded[0].sample_rate,
        };

        let mut samples: Vec<f32> = Vec::new();
        let mut silences = Vec::with_capacity(decoded.len().saturating_sub(1));

        for (index, audio) in decoded.into_iter().enumerate() {
            if index > 0 {
                let pause = self.silence.draw(rng);
                let frames = codec::frames_for(pause, sample_rate);
                samples.resize(samples.len() + frames, 0.0);
                silences.push(pause);
            }
            samples.extend(audio.to_mono(sample_rate).samples);
        }

        let output = DecodedAudio::new(samples, sample_rate, 1);
        let duration = output.duration();
        let bytes = codec::encode_wav(&output).map_err(AssemblyError::Encode)?;

        log::debug!(
            "Assembled {} segments into {:.2}s of audio at {} Hz",
            segments.len(),
            duration.as_secs_f64(),
            sample_rate
        );

        Ok(AudioArtifact {
            bytes,
            sample_rate,
            channels: 1,
            duration,
            silences,
        })
    }
}
