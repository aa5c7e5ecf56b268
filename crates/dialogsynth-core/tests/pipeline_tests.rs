use dialogsynth_core::retry::RetryConfig;
use dialogsynth_core::{
    Config, ConversationOutcome, ConversationRequest, Pipeline, PipelineError, SilenceConfig,
    Speaker,
};
use dialogsynth_speech::{Engine, Gender};
use dialogsynth_test_utils::{MockSpeechProvider, MockTextGenerator, neural_voice, standard_voice};
use rstest::rstest;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

const BILLING_CALL: &str = "Agent: Hello, how can I help?\n\
Customer: My bill is wrong this month.\n\
Agent: Let me check that for you.\n\
Customer: Thank you.";

fn config(silence_ms: u64) -> Config {
    let mut config = Config::default();
    config.pipeline.silence = SilenceConfig::fixed(silence_ms);
    config.pipeline.seed = Some(7);
    config.retry = RetryConfig {
        max_attempts: 4,
        base_delay_ms: 0,
        max_delay_ms: 0,
        jitter_ratio: 0.0,
    };
    config
}

fn english_voices() -> MockSpeechProvider {
    MockSpeechProvider::new(vec![
        neural_voice("Joanna", "en-US", Gender::Female),
        neural_voice("Matthew", "en-US", Gender::Male),
    ])
}

fn pipeline(
    generator: MockTextGenerator,
    speech: Arc<MockSpeechProvider>,
    config: &Config,
    output_dir: &Path,
) -> Pipeline {
    Pipeline::new(Arc::new(generator), speech, config, output_dir).unwrap()
}

fn alternating_transcript(turns: usize) -> String {
    (0..turns)
        .map(|i| {
            if i % 2 == 0 {
                format!("Agent: Agent line number {}.", i)
            } else {
                format!("Customer: Customer reply {}.", i)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).filter(|e| e.path().is_file()).count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_four_turn_call_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let speech = Arc::new(english_voices());
    let pipeline = pipeline(
        MockTextGenerator::new(""),
        speech.clone(),
        &config(500),
        dir.path(),
    );

    let rendered = pipeline
        .process_transcript(&ConversationRequest::new("en-US"), BILLING_CALL)
        .await
        .unwrap();

    let turns = rendered.conversation.turns();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0].speaker(), Speaker::Agent);
    assert_eq!(turns[3].text(), "Thank you.");
    assert!(!rendered.voices.is_shared());

    // Every turn was sent with its speaker's voice, text untouched.
    let mut calls = speech.calls();
    calls.sort_by_key(|call| turns.iter().position(|t| t.text() == call.text));
    assert_eq!(calls.len(), 4);
    for (turn, call) in turns.iter().zip(&calls) {
        assert_eq!(call.text, turn.text());
        assert_eq!(call.voice_id, rendered.voices.voice_for(turn.speaker()).id);
        assert_eq!(call.engine, Engine::Neural);
    }

    let speech_total: Duration = turns.iter().map(|t| speech.duration_for(t.text())).sum();
    assert_eq!(rendered.segment_durations.iter().sum::<Duration>(), speech_total);
    assert_eq!(rendered.artifact.silences(), &[Duration::from_millis(500); 3]);

    let expected = speech_total + Duration::from_millis(1_500);
    let actual = rendered.artifact.duration();
    assert!(
        actual.abs_diff(expected) <= Duration::from_millis(2),
        "expected {:?}, got {:?}",
        expected,
        actual
    );

    assert_eq!(
        rendered.transcript,
        "Agent: Hello, how can I help?\n\
         Customer: My bill is wrong this month.\n\
         Agent: Let me check that for you.\n\
         Customer: Thank you.\n"
    );

    // Rendering alone writes nothing.
    assert_eq!(files_in(dir.path()), 0);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
#[tokio::test]
async fn test_duration_is_speech_plus_silence(#[case] turn_count: usize) {
    let dir = tempfile::tempdir().unwrap();
    let speech = Arc::new(english_voices());
    let pipeline = pipeline(
        MockTextGenerator::new(""),
        speech.clone(),
        &config(400),
        dir.path(),
    );

    let rendered = pipeline
        .process_transcript(
            &ConversationRequest::new("en-US"),
            &alternating_transcript(turn_count),
        )
        .await
        .unwrap();

    assert_eq!(rendered.conversation.turns().len(), turn_count);
    let gaps = turn_count as u32 - 1;
    let expected = rendered.segment_durations.iter().sum::<Duration>()
        + Duration::from_millis(400) * gaps;
    assert!(rendered.artifact.duration().abs_diff(expected) <= Duration::from_millis(2));
}

#[tokio::test]
async fn test_random_silence_stays_in_range() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(0);
    config.pipeline.silence = SilenceConfig {
        min_ms: 300,
        max_ms: 800,
    };
    let pipeline = pipeline(
        MockTextGenerator::new(""),
        Arc::new(english_voices()),
        &config,
        dir.path(),
    );

    let rendered = pipeline
        .process_transcript(&ConversationRequest::new("en-US"), &alternating_transcript(6))
        .await
        .unwrap();

    assert_eq!(rendered.artifact.silences().len(), 5);
    for pause in rendered.artifact.silences() {
        assert!(*pause >= Duration::from_millis(300) && *pause <= Duration::from_millis(800));
    }
}

#[tokio::test]
async fn test_neural_rejection_falls_back_to_standard() {
    let dir = tempfile::tempdir().unwrap();
    let speech = Arc::new(english_voices().reject_engine("Matthew", Engine::Neural));
    let pipeline = pipeline(
        MockTextGenerator::new(""),
        speech.clone(),
        &config(100),
        dir.path(),
    );

    let rendered = pipeline
        .process_transcript(&ConversationRequest::new("en-US"), BILLING_CALL)
        .await
        .unwrap();
    assert_eq!(rendered.conversation.turns().len(), 4);

    let matthew: Vec<Engine> = speech
        .calls()
        .into_iter()
        .filter(|call| call.voice_id == "Matthew")
        .map(|call| call.engine)
        .collect();
    // Two turns, each tried with neural first and standard second.
    assert_eq!(matthew.iter().filter(|e| **e == Engine::Neural).count(), 2);
    assert_eq!(matthew.iter().filter(|e| **e == Engine::Standard).count(), 2);
}

#[tokio::test]
async fn test_rejected_standard_engine_escalates() {
    let dir = tempfile::tempdir().unwrap();
    let speech = Arc::new(
        english_voices()
            .reject_engine("Joanna", Engine::Neural)
            .reject_engine("Joanna", Engine::Standard),
    );
    let pipeline = pipeline(MockTextGenerator::new(""), speech, &config(100), dir.path());

    let err = pipeline
        .process_transcript(&ConversationRequest::new("en-US"), BILLING_CALL)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::EngineUnsupported { ref voice_id, engine: Engine::Standard } if voice_id == "Joanna"
    ));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let dir = tempfile::tempdir().unwrap();
    let speech = Arc::new(english_voices().with_transient_failures(2));
    let pipeline = pipeline(
        MockTextGenerator::new(""),
        speech.clone(),
        &config(100),
        dir.path(),
    );

    pipeline
        .process_transcript(&ConversationRequest::new("en-US"), BILLING_CALL)
        .await
        .unwrap();
    assert_eq!(speech.calls().len(), 6);
}

#[tokio::test]
async fn test_transient_failures_escalate_after_max_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(100);
    config.retry.max_attempts = 2;
    let speech = Arc::new(english_voices().with_transient_failures(1_000));
    let pipeline = pipeline(MockTextGenerator::new(""), speech, &config, dir.path());

    let err = pipeline
        .process_transcript(&ConversationRequest::new("en-US"), BILLING_CALL)
        .await
        .unwrap_err();
    assert_eq!(err.reason_code(), "provider_transient");
}

#[tokio::test]
async fn test_overlong_utterance_never_reaches_provider() {
    let dir = tempfile::tempdir().unwrap();
    let speech = Arc::new(english_voices().with_max_input_chars(30));
    let pipeline = pipeline(
        MockTextGenerator::new(""),
        speech.clone(),
        &config(100),
        dir.path(),
    );

    let long_line = "word ".repeat(20);
    let transcript = format!("Agent: Hi.\nCustomer: {}", long_line);
    let err = pipeline
        .process_transcript(&ConversationRequest::new("en-US"), &transcript)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::UtteranceTooLong { max: 30, .. }));
    assert!(speech.calls().iter().all(|call| call.text.len() <= 30));
}

#[tokio::test]
async fn test_language_without_voices_fails() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        MockTextGenerator::new(""),
        Arc::new(english_voices()),
        &config(100),
        dir.path(),
    );

    let err = pipeline
        .process_transcript(
            &ConversationRequest::new("cy-GB"),
            "Asiant: Bore da.\nCwsmer: Helo.",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoVoicesAvailable { ref language } if language == "cy-GB"));
}

#[tokio::test]
async fn test_single_voice_language_shares_voice() {
    let dir = tempfile::tempdir().unwrap();
    let speech = Arc::new(MockSpeechProvider::new(vec![standard_voice(
        "Gwyneth",
        "cy-GB",
        Gender::Female,
    )]));
    let pipeline = pipeline(
        MockTextGenerator::new(""),
        speech.clone(),
        &config(100),
        dir.path(),
    );

    let rendered = pipeline
        .process_transcript(
            &ConversationRequest::new("cy-GB"),
            "Asiant: Bore da.\nCwsmer: Helo.",
        )
        .await
        .unwrap();
    assert!(rendered.voices.is_shared());
    assert!(speech.calls().iter().all(|call| call.engine == Engine::Standard));
    assert_eq!(rendered.transcript, "Asiant: Bore da.\nCwsmer: Helo.\n");
}

#[rstest]
#[case("", "empty_input")]
#[case("Customer: I start.\nAgent: Hello.", "starts_with_customer")]
#[tokio::test]
async fn test_parse_failures_surface(#[case] raw: &str, #[case] code: &str) {
    let dir = tempfile::tempdir().unwrap();
    let speech = Arc::new(english_voices());
    let pipeline = pipeline(
        MockTextGenerator::new(""),
        speech.clone(),
        &config(100),
        dir.path(),
    );

    let err = pipeline
        .process_transcript(&ConversationRequest::new("en-US"), raw)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Parse(_)));
    assert_eq!(err.reason_code(), code);
    assert_eq!(speech.catalog_calls(), 0);
}

#[tokio::test]
async fn test_run_conversation_writes_transcript_and_audio() {
    let dir = tempfile::tempdir().unwrap();
    let generator = MockTextGenerator::new(BILLING_CALL).with_transient_failures(1);
    let pipeline = pipeline(generator, Arc::new(english_voices()), &config(250), dir.path());

    let outcome = pipeline
        .run_conversation(&ConversationRequest::new("en-US"))
        .await;
    let done = match outcome {
        ConversationOutcome::Completed(done) => done,
        ConversationOutcome::Failed(failed) => panic!("conversation failed: {}", failed.reason),
    };

    assert_eq!(done.turns, 4);
    assert_ne!(done.agent_voice, done.customer_voice);
    assert!(done.artifacts.transcript_path.starts_with(dir.path()));
    assert!(done.artifacts.audio_path.starts_with(dir.path().join("audio")));

    let name = done
        .artifacts
        .transcript_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap()
        .to_string();
    assert!(name.starts_with(&format!("en-US_{}_{}_", done.spec.domain, done.spec.sentiment)));
    assert!(name.ends_with(".txt"));

    let transcript = std::fs::read_to_string(&done.artifacts.transcript_path).unwrap();
    assert_eq!(transcript.lines().count(), 4);
    assert!(transcript.starts_with("Agent: Hello, how can I help?\n"));

    let wav = std::fs::read(&done.artifacts.audio_path).unwrap();
    assert_eq!(&wav[..4], b"RIFF");
    assert_eq!(files_in(dir.path()), 1);
    assert_eq!(files_in(&dir.path().join("audio")), 1);
}

#[tokio::test]
async fn test_failed_conversation_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let speech = Arc::new(english_voices().fail_on_text("bill"));
    let pipeline = pipeline(
        MockTextGenerator::new(BILLING_CALL),
        speech,
        &config(250),
        dir.path(),
    );

    let outcome = pipeline
        .run_conversation(&ConversationRequest::new("en-US"))
        .await;
    match outcome {
        ConversationOutcome::Failed(failed) => {
            assert_eq!(failed.code, "speech");
            assert_eq!(failed.spec.language_code, "en-US");
        }
        ConversationOutcome::Completed(_) => panic!("expected a failure"),
    }

    assert_eq!(files_in(dir.path()), 0);
    assert_eq!(files_in(&dir.path().join("audio")), 0);
}

#[tokio::test]
async fn test_prompt_carries_requested_attributes() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(MockTextGenerator::new("Agent: Bonjour.\nClient: Salut."));
    let speech = Arc::new(MockSpeechProvider::new(vec![
        neural_voice("Lea", "fr-FR", Gender::Female),
        neural_voice("Remi", "fr-FR", Gender::Male),
    ]));
    let pipeline = Pipeline::new(generator.clone(), speech, &config(100), dir.path()).unwrap();

    let request = ConversationRequest::new("fr-FR")
        .with_sentiment(dialogsynth_core::Sentiment::Confused)
        .with_domain("billing_inquiries")
        .with_topic("roaming charges");
    let outcome = pipeline.run_conversation(&request).await;
    assert!(outcome.is_completed());

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("in French"));
    assert!(prompts[0].contains("roaming charges"));
    assert!(prompts[0].contains("Client"));
}

#[tokio::test]
async fn test_failed_turn_cancels_sibling_syntheses() {
    let dir = tempfile::tempdir().unwrap();
    let speech = Arc::new(
        english_voices()
            .fail_on_text("bill")
            .with_delay(Duration::from_millis(600)),
    );
    let mut config = config(100);
    config.pipeline.max_concurrent_turns = 4;
    let pipeline = pipeline(MockTextGenerator::new(""), speech.clone(), &config, dir.path());

    let started = Instant::now();
    let err = pipeline
        .process_transcript(&ConversationRequest::new("en-US"), BILLING_CALL)
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err.reason_code(), "speech");
    assert!(
        elapsed < Duration::from_millis(300),
        "failure took {:?}, siblings were awaited",
        elapsed
    );
    // The failing turn plus at least one sibling were already dispatched.
    assert!(speech.calls().len() >= 2);

    // Outlive the sibling delay: a detached sibling would complete by now.
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(speech.completions(), 0);
}

#[tokio::test]
async fn test_empty_generation_fails_as_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    let speech = Arc::new(MockSpeechProvider::new(vec![
        neural_voice("Joanna", "en-US", Gender::Female),
        neural_voice("Lea", "fr-FR", Gender::Female),
        neural_voice("Remi", "fr-FR", Gender::Male),
    ]));
    let generator = MockTextGenerator::new("").respond_when("in English", BILLING_CALL);
    let pipeline = pipeline(generator, speech.clone(), &config(100), dir.path());

    let outcome = pipeline
        .run_conversation(&ConversationRequest::new("fr-FR"))
        .await;
    match outcome {
        ConversationOutcome::Failed(failed) => {
            assert_eq!(failed.code, "empty_input");
            assert_eq!(failed.spec.language_code, "fr-FR");
        }
        ConversationOutcome::Completed(_) => panic!("an empty transcript cannot complete"),
    }
    assert_eq!(speech.catalog_calls(), 0);
    assert_eq!(files_in(dir.path()), 0);

    let outcome = pipeline
        .run_conversation(&ConversationRequest::new("en-US"))
        .await;
    assert!(outcome.is_completed());
}

#[tokio::test]
async fn test_wav_segments_are_resampled_to_output_rate() {
    let dir = tempfile::tempdir().unwrap();
    let speech = Arc::new(english_voices().with_wav_output().with_sample_rate(24_000));
    let mut config = config(200);
    config.pipeline.output_sample_rate = Some(16_000);
    let pipeline = pipeline(MockTextGenerator::new(""), speech.clone(), &config, dir.path());

    let rendered = pipeline
        .process_transcript(&ConversationRequest::new("en-US"), BILLING_CALL)
        .await
        .unwrap();

    assert_eq!(rendered.artifact.sample_rate(), 16_000);
    assert_eq!(&rendered.artifact.bytes()[..4], b"RIFF");

    let turns = rendered.conversation.turns();
    let speech_total: Duration = turns.iter().map(|t| speech.duration_for(t.text())).sum();
    let expected = speech_total + Duration::from_millis(600);
    let actual = rendered.artifact.duration();
    assert!(
        actual.abs_diff(expected) <= Duration::from_millis(2),
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}
