//! Audio decoding, resampling and WAV encoding.
//!
//! Providers hand back audio in whatever encoding they produce. Everything is
//! decoded to interleaved `f32` samples in `[-1.0, 1.0]` before it is stitched,
//! and the stitched result is written as 16-bit PCM WAV.

use crate::{AudioEncoding, AudioFormat};
use std::io::Cursor;
use std::time::Duration;

/// Errors raised while decoding or encoding audio buffers.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to read or write WAV data: {0}")]
    Wav(#[from] hound::Error),
    #[error("Malformed PCM buffer: {0}")]
    MalformedPcm(String),
    #[error("Unsupported WAV format: {0}")]
    UnsupportedWavFormat(String),
    #[error("Invalid audio format: sample_rate={sample_rate}, channels={channels}")]
    InvalidFormat { sample_rate: u32, channels: u16 },
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Decoded, interleaved audio samples
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedAudio {
    /// Samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration(&self) -> Duration {
        frames_to_duration(self.frames(), self.sample_rate)
    }

    /// Downmix to one channel and resample to `sample_rate`
    pub fn to_mono(self, sample_rate: u32) -> Self {
        let samples = if self.channels > 1 {
            downmix_to_mono(&self.samples, usize::from(self.channels))
        } else {
            self.samples
        };
        let samples = resample(&samples, 1, self.sample_rate, sample_rate);
        Self::new(samples, sample_rate, 1)
    }
}

/// Number of whole frames covering `duration` at `sample_rate` (rounded to nearest)
pub fn frames_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * f64::from(sample_rate)).round() as usize
}

pub fn frames_to_duration(frames: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(frames as f64 / f64::from(sample_rate))
}

/// Decode an encoded buffer into interleaved `f32` samples.
pub fn decode(bytes: &[u8], format: &AudioFormat) -> CodecResult<DecodedAudio> {
    match format.encoding {
        AudioEncoding::Wav => decode_wav(bytes),
        AudioEncoding::Pcm16 => decode_pcm16(bytes, format.sample_rate, format.channels),
    }
}

/// Duration of an encoded buffer, reading only headers where the encoding allows.
pub fn duration_of(bytes: &[u8], format: &AudioFormat) -> CodecResult<Duration> {
    match format.encoding {
        AudioEncoding::Wav => {
            let reader = hound::WavReader::new(Cursor::new(bytes))?;
            let spec = reader.spec();
            Ok(frames_to_duration(
                reader.duration() as usize,
                spec.sample_rate,
            ))
        }
        AudioEncoding::Pcm16 => {
            validate_format(format.sample_rate, format.channels)?;
            let frame_bytes = 2 * usize::from(format.channels);
            if bytes.len() % frame_bytes != 0 {
                return Err(CodecError::MalformedPcm(format!(
                    "{} bytes is not a whole number of {}-byte frames",
                    bytes.len(),
                    frame_bytes
                )));
            }
            Ok(frames_to_duration(
                bytes.len() / frame_bytes,
                format.sample_rate,
            ))
        }
    }
}

fn validate_format(sample_rate: u32, channels: u16) -> CodecResult<()> {
    if sample_rate == 0 || channels == 0 {
        return Err(CodecError::InvalidFormat {
            sample_rate,
            channels,
        });
    }
    Ok(())
}

fn decode_wav(bytes: &[u8]) -> CodecResult<DecodedAudio> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    validate_format(spec.sample_rate, spec.channels)?;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => match spec.bits_per_sample {
            bits @ 8..=32 => {
                let scale = (1i64 << (bits - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
            bits => {
                return Err(CodecError::UnsupportedWavFormat(format!(
                    "unsupported bit depth: {bits}"
                )));
            }
        },
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
    };

    Ok(DecodedAudio::new(samples, spec.sample_rate, spec.channels))
}

fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> CodecResult<DecodedAudio> {
    validate_format(sample_rate, channels)?;
    let frame_bytes = 2 * usize::from(channels);
    if bytes.len() % frame_bytes != 0 {
        return Err(CodecError::MalformedPcm(format!(
            "{} bytes is not a whole number of {}-byte frames",
            bytes.len(),
            frame_bytes
        )));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / i16::MAX as f32)
        .collect();

    Ok(DecodedAudio::new(samples, sample_rate, channels))
}

/// Encode samples as 16-bit PCM WAV.
pub fn encode_wav(audio: &DecodedAudio) -> CodecResult<Vec<u8>> {
    validate_format(audio.sample_rate, audio.channels)?;
    let spec = hound::WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for sample in &audio.samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32).round() as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    samples
        .chunks(channels)
        .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear-interpolation resampler over interleaved samples.
pub fn resample(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let channels = channels.max(1);
    let frame_count = samples.len() / channels;
    if frame_count == 0 {
        return Vec::new();
    }

    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let target_frames = (frame_count as f64 / ratio).round() as usize;
    let mut out = Vec::with_capacity(target_frames * channels);

    for i in 0..target_frames {
        let src_pos = i as f64 * ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        for ch in 0..channels {
            let base = src_idx * channels + ch;
            let next = base + channels;

            let sample = if next < samples.len() {
                samples[base] * (1.0 - frac) + samples[next] * frac
            } else if base < samples.len() {
                samples[base]
            } else {
                0.0
            };
            out.push(sample);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_pcm16_duration_and_decode_agree() {
        let bytes = pcm_bytes(&vec![1000; 16_000]);
        let format = AudioFormat::pcm16(16_000, 1);

        let duration = duration_of(&bytes, &format).unwrap();
        assert_eq!(duration, Duration::from_secs(1));

        let decoded = decode(&bytes, &format).unwrap();
        assert_eq!(decoded.frames(), 16_000);
        assert_eq!(decoded.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_pcm16_rejects_partial_frames() {
        let format = AudioFormat::pcm16(16_000, 2);
        let err = decode(&[0, 1, 2], &format).unwrap_err();
        assert!(matches!(err, CodecError::MalformedPcm(_)));
    }

    #[test]
    fn test_wav_encode_then_read_header() {
        let audio = DecodedAudio::new(vec![0.25; 8_000], 8_000, 1);
        let bytes = encode_wav(&audio).unwrap();

        let format = AudioFormat::wav(8_000, 1);
        assert_eq!(duration_of(&bytes, &format).unwrap(), Duration::from_secs(1));

        let decoded = decode(&bytes, &format).unwrap();
        assert_eq!(decoded.sample_rate, 8_000);
        assert!((decoded.samples[0] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_garbage_wav_is_an_error() {
        let format = AudioFormat::wav(24_000, 1);
        assert!(decode(b"definitely not a riff header", &format).is_err());
    }

    #[test]
    fn test_to_mono_downmixes_and_resamples() {
        let stereo = DecodedAudio::new(vec![0.5, -0.5, 1.0, 0.0].repeat(12_000), 24_000, 2);
        let mono = stereo.to_mono(16_000);
        assert_eq!(mono.channels, 1);
        assert_eq!(mono.sample_rate, 16_000);
        assert_eq!(mono.frames(), 16_000);
    }
}
