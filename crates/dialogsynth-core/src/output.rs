//! Writing finished conversations to disk.
//!
//! Both files of a conversation are staged as temp files in their target
//! directories and only persisted once both have been fully written.

use crate::assembler::AudioArtifact;
use crate::conversation::ConversationSpec;
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Paths of one emitted conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedArtifacts {
    pub transcript_path: PathBuf,
    pub audio_path: PathBuf,
}

/// Transcripts go to `output_dir`, audio to `output_dir/audio`
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    audio_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let audio_dir = output_dir.join("audio");
        Self {
            output_dir,
            audio_dir,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Create the output directories if they do not exist yet.
    pub fn prepare(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.audio_dir)
    }

    /// `{language}_{domain}_{sentiment}_{timestamp}_{id8}`
    pub fn base_name(spec: &ConversationSpec, now: DateTime<Local>, id: Uuid) -> String {
        let short_id: String = id.simple().to_string().chars().take(8).collect();
        format!(
            "{}_{}_{}_{}_{}",
            file_component(&spec.language_code),
            file_component(&spec.domain),
            spec.sentiment,
            now.format("%Y%m%d_%H%M%S"),
            short_id
        )
    }

    /// Write `{base}.txt` and `audio/{base}.wav`.
    ///
    /// Nothing is left behind when either write fails.
    pub fn emit(
        &self,
        base: &str,
        transcript: &str,
        audio: &AudioArtifact,
    ) -> std::io::Result<EmittedArtifacts> {
        self.prepare()?;

        let transcript_path = self.output_dir.join(format!("{}.txt", base));
        let audio_path = self.audio_dir.join(format!("{}.wav", base));

        let staged_transcript = stage(&self.output_dir, transcript.as_bytes())?;
        let staged_audio = stage(&self.audio_dir, audio.bytes())?;

        staged_transcript
            .persist(&transcript_path)
            .map_err(|e| e.error)?;

        if let Err(e) = staged_audio.persist(&audio_path) {
            if let Err(cleanup) = std::fs::remove_file(&transcript_path) {
                log::warn!(
                    "Could not remove {} after failed audio write: {}",
                    transcript_path.display(),
                    cleanup
                );
            }
            return Err(e.error);
        }

        log::info!(
            "Wrote {} and {}",
            transcript_path.display(),
            audio_path.display()
        );

        Ok(EmittedArtifacts {
            transcript_path,
            audio_path,
        })
    }
}

fn stage(dir: &Path, contents: &[u8]) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.flush()?;
    Ok(file)
}

fn file_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{AudioAssembler, SilenceConfig};
    use crate::prompt::Sentiment;
    use crate::random::RandomSource;
    use crate::synthesizer::AudioSegment;
    use bytes::Bytes;
    use chrono::TimeZone;
    use dialogsynth_speech::{AudioFormat, Engine};

    fn spec() -> ConversationSpec {
        ConversationSpec {
            language_code: "en-US".to_string(),
            domain: "billing inquiries".to_string(),
            topic: "refund status".to_string(),
            sentiment: Sentiment::Angry,
        }
    }

    fn artifact() -> AudioArtifact {
        let segment = AudioSegment::new(
            Bytes::from(vec![0u8; 3_200]),
            AudioFormat::pcm16(16_000, 1),
            "v",
            Engine::Standard,
        )
        .unwrap();
        AudioAssembler::new(SilenceConfig::fixed(0), None)
            .assemble(&[Some(segment)], &RandomSource::from_seed(1))
            .unwrap()
    }

    #[test]
    fn test_base_name_layout() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let id = Uuid::parse_str("1b4e28ba-2fa1-11d2-883f-0016d3cca427").unwrap();
        assert_eq!(
            ArtifactWriter::base_name(&spec(), now, id),
            "en-US_billing_inquiries_angry_20240309_140507_1b4e28ba"
        );
    }

    #[test]
    fn test_emit_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        let emitted = writer
            .emit("sample", "Agent: Hello\nCustomer: Hi\n", &artifact())
            .unwrap();

        assert_eq!(emitted.transcript_path, dir.path().join("sample.txt"));
        assert_eq!(emitted.audio_path, dir.path().join("audio").join("sample.wav"));
        assert_eq!(
            std::fs::read_to_string(&emitted.transcript_path).unwrap(),
            "Agent: Hello\nCustomer: Hi\n"
        );
        let wav = std::fs::read(&emitted.audio_path).unwrap();
        assert_eq!(&wav[..4], b"RIFF");

        // Only the two persisted files remain.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
        assert_eq!(std::fs::read_dir(writer.audio_dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_emit_cleans_up_when_audio_cannot_be_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path());
        writer.prepare().unwrap();
        // A directory in the way of the audio file makes the rename fail.
        std::fs::create_dir(writer.audio_dir().join("blocked.wav")).unwrap();
        std::fs::write(writer.audio_dir().join("blocked.wav").join("keep"), b"x").unwrap();

        assert!(writer.emit("blocked", "Agent: Hi\n", &artifact()).is_err());
        assert!(!dir.path().join("blocked.txt").exists());
    }
}
