//! Per-conversation orchestration: generate, parse, voice, synthesize,
//! assemble, emit.

mod batch;
mod state;

pub use batch::BatchReport;
pub use state::{ConversationState, StateTracker};

use crate::assembler::{AudioArtifact, AudioAssembler};
use crate::config::{Config, validate_config};
use crate::conversation::{Conversation, ConversationRequest, ConversationSpec};
use crate::error::{ConfigError, PipelineError, Result};
use crate::labels::LabelTable;
use crate::output::{ArtifactWriter, EmittedArtifacts};
use crate::prompt::{DomainCatalog, build_prompt};
use crate::random::RandomSource;
use crate::retry::{RetryAttempt, RetryPolicy, retry_with_backoff};
use crate::synthesizer::{AudioSegment, TurnSynthesizer};
use crate::voice::{SelectionOptions, VoiceAssignment, select_voices};
use chrono::Local;
use dialogsynth_llm::TextGenerator;
use dialogsynth_speech::SpeechProvider;
use futures::{StreamExt, stream};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// A conversation rendered to audio but not yet written anywhere
#[derive(Debug, Clone)]
pub struct RenderedConversation {
    pub conversation: Conversation,
    pub voices: VoiceAssignment,
    /// Transcript with the language's canonical labels
    pub transcript: String,
    /// Per-turn audio durations, in turn order
    pub segment_durations: Vec<Duration>,
    pub artifact: AudioArtifact,
}

#[derive(Debug, Clone)]
pub struct CompletedConversation {
    pub spec: ConversationSpec,
    pub turns: usize,
    pub duration: Duration,
    pub agent_voice: String,
    pub customer_voice: String,
    pub artifacts: EmittedArtifacts,
}

#[derive(Debug, Clone)]
pub struct FailedConversation {
    pub spec: ConversationSpec,
    /// Stable reason code, e.g. `no_voices_available`
    pub code: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum ConversationOutcome {
    Completed(CompletedConversation),
    Failed(FailedConversation),
}

impl ConversationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ConversationOutcome::Completed(_))
    }

    pub fn spec(&self) -> &ConversationSpec {
        match self {
            ConversationOutcome::Completed(done) => &done.spec,
            ConversationOutcome::Failed(failed) => &failed.spec,
        }
    }
}

/// Shared, read-only state for every conversation of a run
pub struct Pipeline {
    generator: Arc<dyn TextGenerator>,
    speech: Arc<dyn SpeechProvider>,
    labels: LabelTable,
    catalog: DomainCatalog,
    selection: SelectionOptions,
    retry: RetryPolicy,
    assembler: AudioAssembler,
    writer: ArtifactWriter,
    rng: RandomSource,
    max_concurrent_turns: usize,
    max_concurrent_conversations: usize,
}

impl Pipeline {
    /// Build a pipeline from a validated configuration.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        speech: Arc<dyn SpeechProvider>,
        config: &Config,
        output_dir: impl Into<PathBuf>,
    ) -> std::result::Result<Self, ConfigError> {
        validate_config(config)?;

        let catalog = DomainCatalog::from_map(&config.domains).unwrap_or_default();
        let pipeline = &config.pipeline;

        Ok(Self {
            generator,
            speech,
            labels: LabelTable::builtin().with_overrides(&config.labels),
            catalog,
            selection: pipeline.selection_options(),
            retry: config.retry.policy(),
            assembler: AudioAssembler::new(pipeline.silence, pipeline.output_sample_rate),
            writer: ArtifactWriter::new(output_dir),
            rng: RandomSource::new(pipeline.seed),
            max_concurrent_turns: pipeline.max_concurrent_turns,
            max_concurrent_conversations: pipeline.max_concurrent_conversations,
        })
    }

    pub fn output_dir(&self) -> &std::path::Path {
        self.writer.output_dir()
    }

    /// Generate, render and write one conversation.
    ///
    /// Failures are returned as [`ConversationOutcome::Failed`]; nothing is
    /// written for a failed conversation.
    pub async fn run_conversation(&self, request: &ConversationRequest) -> ConversationOutcome {
        let spec = request.resolve(&self.catalog, &self.rng);
        let mut tracker = StateTracker::new(spec.to_string());
        log::info!("Starting conversation {}", spec);

        match self.generate_and_emit(&spec, &mut tracker).await {
            Ok(done) => {
                tracker.advance(ConversationState::Done);
                log::info!(
                    "Completed {}: {} turns, {:.1}s",
                    spec,
                    done.turns,
                    done.duration.as_secs_f64()
                );
                ConversationOutcome::Completed(done)
            }
            Err(err) => {
                tracker.fail(err.reason_code());
                log::error!("Conversation {} failed: {}", spec, err);
                ConversationOutcome::Failed(FailedConversation {
                    spec,
                    code: err.reason_code(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Render an existing transcript without calling the text generator.
    pub async fn process_transcript(
        &self,
        request: &ConversationRequest,
        raw_text: &str,
    ) -> Result<RenderedConversation> {
        let spec = request.resolve(&self.catalog, &self.rng);
        let mut tracker = StateTracker::new(spec.to_string());
        let rendered = self.render(spec, raw_text, &mut tracker).await;
        if let Err(err) = &rendered {
            tracker.fail(err.reason_code());
        }
        rendered
    }

    /// Write a rendered conversation under the output directory.
    pub fn emit(&self, rendered: &RenderedConversation) -> Result<EmittedArtifacts> {
        let base = ArtifactWriter::base_name(
            rendered.conversation.spec(),
            Local::now(),
            Uuid::new_v4(),
        );
        let emitted = self
            .writer
            .emit(&base, &rendered.transcript, &rendered.artifact)?;
        Ok(emitted)
    }

    async fn generate_and_emit(
        &self,
        spec: &ConversationSpec,
        tracker: &mut StateTracker,
    ) -> Result<CompletedConversation> {
        let labels = self.labels.lookup(&spec.language_code);
        let prompt = build_prompt(spec, labels);

        let generator = &self.generator;
        let prompt = prompt.as_str();
        let raw_text = retry_with_backoff(
            &self.retry,
            move |_attempt| async move {
                generator
                    .generate(prompt)
                    .await
                    .map_err(PipelineError::from)
            },
            |info, err| log_retry("text generation", info, err),
        )
        .await?;

        let rendered = self.render(spec.clone(), &raw_text, tracker).await?;
        let artifacts = self.emit(&rendered)?;

        Ok(CompletedConversation {
            spec: spec.clone(),
            turns: rendered.conversation.turns().len(),
            duration: rendered.artifact.duration(),
            agent_voice: rendered.voices.agent.id.clone(),
            customer_voice: rendered.voices.customer.id.clone(),
            artifacts,
        })
    }

    async fn render(
        &self,
        spec: ConversationSpec,
        raw_text: &str,
        tracker: &mut StateTracker,
    ) -> Result<RenderedConversation> {
        let labels = self.labels.lookup(&spec.language_code);
        let conversation = Conversation::parse(spec, raw_text, labels)?;
        tracker.advance(ConversationState::Parsed);

        let voices = self.choose_voices(conversation.language_code()).await?;
        tracker.advance(ConversationState::VoicesSelected);

        tracker.advance(ConversationState::Synthesizing);
        let segments = self.synthesize_turns(&conversation, &voices).await?;
        let segment_durations = segments
            .iter()
            .flatten()
            .map(AudioSegment::duration)
            .collect();

        let artifact = self.assembler.assemble(&segments, &self.rng)?;
        tracker.advance(ConversationState::Assembled);

        Ok(RenderedConversation {
            transcript: conversation.transcript(labels),
            conversation,
            voices,
            segment_durations,
            artifact,
        })
    }

    async fn choose_voices(&self, language_code: &str) -> Result<VoiceAssignment> {
        let speech = &self.speech;
        let voices = retry_with_backoff(
            &self.retry,
            move |_attempt| async move {
                speech
                    .list_voices(language_code)
                    .await
                    .map_err(PipelineError::from)
            },
            |info, err| log_retry("voice listing", info, err),
        )
        .await?;

        select_voices(language_code, &voices, &self.selection, &self.rng)
    }

    /// Synthesize every turn, at most `max_concurrent_turns` at a time.
    ///
    /// The first failure drops the stream, which cancels the turns still in
    /// flight.
    async fn synthesize_turns(
        &self,
        conversation: &Conversation,
        voices: &VoiceAssignment,
    ) -> Result<Vec<Option<AudioSegment>>> {
        let synthesizer = TurnSynthesizer::new(self.speech.clone(), conversation.language_code());
        let synthesizer = &synthesizer;
        let retry = &self.retry;
        let turns = conversation.turns();

        let mut pending = stream::iter(turns.iter().enumerate())
            .map(move |(index, turn)| async move {
                let voice = voices.voice_for(turn.speaker());
                let text = turn.text();
                let engine = voices.engine;
                let segment = retry_with_backoff(
                    retry,
                    move |_attempt| synthesizer.synthesize(text, voice, engine),
                    |info, err| log_retry(&format!("turn {} ({})", index, voice.id), info, err),
                )
                .await;
                (index, segment)
            })
            .buffer_unordered(self.max_concurrent_turns);

        let mut slots: Vec<Option<AudioSegment>> = (0..turns.len()).map(|_| None).collect();
        while let Some((index, segment)) = pending.next().await {
            slots[index] = Some(segment?);
        }
        Ok(slots)
    }
}

fn log_retry(what: &str, info: RetryAttempt, err: &PipelineError) {
    log::warn!(
        "{} failed on attempt {} ({}), retrying in {}ms",
        what,
        info.attempt,
        err,
        info.delay.as_millis()
    );
}
