use crate::audio::{tone_pcm16, tone_wav};
use async_trait::async_trait;
use bytes::Bytes;
use dialogsynth_speech::{
    AudioEncoding, AudioFormat, Engine, SpeechError, SpeechProvider, SpeechResult,
    SpeechSynthesisProvider, SynthesisRequest, SynthesizedAudio, VoiceCatalogProvider,
    VoiceProfile,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory speech provider with scripted failures.
///
/// Every utterance renders as a tone lasting 10 ms per character, so
/// tests can predict segment durations exactly.
#[derive(Debug)]
pub struct MockSpeechProvider {
    voices: Vec<VoiceProfile>,
    max_input_chars: usize,
    sample_rate: u32,
    encoding: AudioEncoding,
    ms_per_char: u64,
    rejected: HashMap<String, HashSet<Engine>>,
    failing_texts: Vec<String>,
    transient_failures: AtomicUsize,
    delay: Option<Duration>,
    calls: Mutex<Vec<SynthesisRequest>>,
    completed: AtomicUsize,
    catalog_calls: AtomicUsize,
}

impl MockSpeechProvider {
    pub fn new(voices: Vec<VoiceProfile>) -> Self {
        Self {
            voices,
            max_input_chars: 3000,
            sample_rate: 16_000,
            encoding: AudioEncoding::Pcm16,
            ms_per_char: 10,
            rejected: HashMap::new(),
            failing_texts: Vec::new(),
            transient_failures: AtomicUsize::new(0),
            delay: None,
            calls: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
            catalog_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Return WAV instead of raw PCM
    pub fn with_wav_output(mut self) -> Self {
        self.encoding = AudioEncoding::Wav;
        self
    }

    /// Answer `EngineUnsupported` for this voice and engine
    pub fn reject_engine(mut self, voice_id: &str, engine: Engine) -> Self {
        self.rejected
            .entry(voice_id.to_string())
            .or_default()
            .insert(engine);
        self
    }

    /// Fail permanently, and without waiting out the delay, on any utterance
    /// containing `needle`
    pub fn fail_on_text(mut self, needle: &str) -> Self {
        self.failing_texts.push(needle.to_string());
        self
    }

    /// Fail the next `count` synthesis calls with a transient error
    pub fn with_transient_failures(self, count: usize) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Sleep before answering every call not scripted to fail by text
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Audio length the mock produces for `text`
    pub fn duration_for(&self, text: &str) -> Duration {
        Duration::from_millis(text.chars().count() as u64 * self.ms_per_char)
    }

    /// Every synthesis request received, in arrival order
    pub fn calls(&self) -> Vec<SynthesisRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Synthesis calls that ran to the end and returned audio
    pub fn completions(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }

    fn take_transient_failure(&self) -> bool {
        self.transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn render(&self, request: &SynthesisRequest) -> SynthesizedAudio {
        let duration = self.duration_for(&request.text);
        // Distinct pitch per voice so stitched output is audibly two speakers.
        let frequency = 180.0 + (request.voice_id.len() % 7) as f32 * 40.0;
        match self.encoding {
            AudioEncoding::Wav => SynthesizedAudio {
                bytes: Bytes::from(tone_wav(duration, self.sample_rate, frequency)),
                format: AudioFormat::wav(self.sample_rate, 1),
            },
            _ => SynthesizedAudio {
                bytes: Bytes::from(tone_pcm16(duration, self.sample_rate, frequency)),
                format: AudioFormat::pcm16(self.sample_rate, 1),
            },
        }
    }
}

#[async_trait]
impl SpeechSynthesisProvider for MockSpeechProvider {
    async fn synthesize(&self, request: SynthesisRequest) -> SpeechResult<SynthesizedAudio> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        if self
            .failing_texts
            .iter()
            .any(|needle| request.text.contains(needle.as_str()))
        {
            return Err(SpeechError::ProviderError(format!(
                "scripted failure for '{}'",
                request.text
            )));
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let length = request.text.chars().count();
        if length > self.max_input_chars {
            return Err(SpeechError::TextTooLong {
                length,
                max: self.max_input_chars,
            });
        }

        if !self.voices.iter().any(|v| v.id == request.voice_id) {
            return Err(SpeechError::VoiceNotFound(request.voice_id));
        }

        if self
            .rejected
            .get(&request.voice_id)
            .is_some_and(|engines| engines.contains(&request.engine))
        {
            return Err(SpeechError::EngineUnsupported {
                voice_id: request.voice_id,
                engine: request.engine,
            });
        }

        if self.take_transient_failure() {
            return Err(SpeechError::Transient {
                message: "scripted throttling".to_string(),
                retry_after: Some(Duration::ZERO),
            });
        }

        let audio = self.render(&request);
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(audio)
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }
}

#[async_trait]
impl VoiceCatalogProvider for MockSpeechProvider {
    async fn list_voices(&self, language_code: &str) -> SpeechResult<Vec<VoiceProfile>> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .voices
            .iter()
            .filter(|voice| voice.speaks(language_code))
            .cloned()
            .collect())
    }
}

impl SpeechProvider for MockSpeechProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }
}
