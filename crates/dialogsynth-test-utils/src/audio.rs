use dialogsynth_speech::codec::{self, DecodedAudio};
use dialogsynth_speech::{Engine, Gender, VoiceProfile};
use std::time::Duration;

fn tone_samples(duration: Duration, sample_rate: u32, frequency: f32) -> Vec<f32> {
    let frames = codec::frames_for(duration, sample_rate);
    (0..frames)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.3 * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Mono sine tone as headerless s16le PCM
pub fn tone_pcm16(duration: Duration, sample_rate: u32, frequency: f32) -> Vec<u8> {
    tone_samples(duration, sample_rate, frequency)
        .into_iter()
        .flat_map(|s| ((s * i16::MAX as f32) as i16).to_le_bytes())
        .collect()
}

/// Mono sine tone as a 16-bit WAV file
pub fn tone_wav(duration: Duration, sample_rate: u32, frequency: f32) -> Vec<u8> {
    let audio = DecodedAudio::new(tone_samples(duration, sample_rate, frequency), sample_rate, 1);
    codec::encode_wav(&audio).expect("encoding an in-memory tone cannot fail")
}

pub fn neural_voice(id: &str, language_code: &str, gender: Gender) -> VoiceProfile {
    VoiceProfile::new(id, language_code)
        .with_engines([Engine::Standard, Engine::Neural])
        .with_gender(gender)
}

pub fn standard_voice(id: &str, language_code: &str, gender: Gender) -> VoiceProfile {
    VoiceProfile::new(id, language_code).with_gender(gender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogsynth_speech::AudioFormat;

    #[test]
    fn test_tones_have_requested_length() {
        let pcm = tone_pcm16(Duration::from_millis(250), 16_000, 440.0);
        assert_eq!(pcm.len(), 4_000 * 2);

        let wav = tone_wav(Duration::from_millis(250), 16_000, 440.0);
        let duration = codec::duration_of(&wav, &AudioFormat::wav(16_000, 1)).unwrap();
        assert_eq!(duration, Duration::from_millis(250));
    }
}
