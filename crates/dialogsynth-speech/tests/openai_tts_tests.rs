use dialogsynth_speech::providers::openai_tts::{OpenAITts, OpenAITtsConfig};
use dialogsynth_speech::{
    AudioEncoding, Engine, Gender, SpeechError, SpeechSynthesisProvider, SynthesisRequest,
    VoiceCatalogProvider, VoiceProfile,
};
use httpmock::prelude::*;
use serde_json::json;

fn provider_for(server: &MockServer, voices: Vec<VoiceProfile>) -> OpenAITts {
    let config = OpenAITtsConfig {
        base_url: server.url("/v1/"),
        voices,
        ..OpenAITtsConfig::default()
    };
    OpenAITts::new("test-key", config).expect("Failed to build speech provider")
}

fn nl_catalog() -> Vec<VoiceProfile> {
    vec![
        VoiceProfile::new("Lotte", "nl-NL").with_gender(Gender::Female),
        VoiceProfile::new("Laura", "nl-NL")
            .with_engines([Engine::Standard, Engine::Neural])
            .with_gender(Gender::Female),
        VoiceProfile::new("Ruben", "nl-NL").with_gender(Gender::Male),
    ]
}

#[tokio::test]
async fn test_synthesize_posts_pcm_request() {
    let server = MockServer::start_async().await;
    let pcm: Vec<u8> = vec![0u8; 4_800];

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/audio/speech")
                .header("authorization", "Bearer test-key")
                .json_body(json!({
                    "model": "tts-1-hd",
                    "input": "Goedemiddag, waarmee kan ik u helpen?",
                    "voice": "Laura",
                    "response_format": "pcm",
                }));
            then.status(200)
                .header("content-type", "audio/pcm")
                .body(pcm.clone());
        })
        .await;

    let provider = provider_for(&server, nl_catalog());
    let audio = provider
        .synthesize(SynthesisRequest::new(
            "Goedemiddag, waarmee kan ik u helpen?",
            "Laura",
            "nl-NL",
            Engine::Neural,
        ))
        .await
        .expect("synthesis should succeed");

    mock.assert_async().await;
    assert_eq!(audio.bytes.len(), 4_800);
    assert_eq!(audio.format.encoding, AudioEncoding::Pcm16);
    assert_eq!(audio.format.sample_rate, 24_000);
}

#[tokio::test]
async fn test_standard_only_voice_rejects_neural_without_network() {
    // No mock registered: any request would surface as a provider error instead.
    let server = MockServer::start_async().await;
    let provider = provider_for(&server, nl_catalog());
    let err = provider
        .synthesize(SynthesisRequest::new("Hallo", "Lotte", "nl-NL", Engine::Neural))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SpeechError::EngineUnsupported { ref voice_id, engine: Engine::Neural } if voice_id == "Lotte"
    ));
}

#[tokio::test]
async fn test_rate_limit_is_transient_with_retry_after() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/audio/speech");
            then.status(429)
                .header("retry-after", "3")
                .body("rate limited");
        })
        .await;

    let provider = provider_for(&server, nl_catalog());
    let err = provider
        .synthesize(SynthesisRequest::new("Hallo", "Ruben", "nl-NL", Engine::Standard))
        .await
        .unwrap_err();

    match err {
        SpeechError::Transient { retry_after, .. } => {
            assert_eq!(retry_after, Some(std::time::Duration::from_secs(3)));
        }
        other => panic!("Expected Transient, got {other:?}"),
    }
}

#[tokio::test]
async fn test_text_over_limit_is_rejected() {
    let server = MockServer::start_async().await;
    let config = OpenAITtsConfig {
        base_url: server.url("/v1/"),
        max_input_chars: 10,
        voices: nl_catalog(),
        ..OpenAITtsConfig::default()
    };
    let provider = OpenAITts::new("test-key", config).unwrap();

    let err = provider
        .synthesize(SynthesisRequest::new(
            "Dit is veel te lang voor de limiet",
            "Ruben",
            "nl-NL",
            Engine::Standard,
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, SpeechError::TextTooLong { max: 10, .. }));
}

#[tokio::test]
async fn test_unknown_voice_and_missing_key() {
    let server = MockServer::start_async().await;
    let provider = provider_for(&server, nl_catalog());
    let err = provider
        .synthesize(SynthesisRequest::new("Hallo", "Matthew", "nl-NL", Engine::Standard))
        .await
        .unwrap_err();
    assert!(matches!(err, SpeechError::VoiceNotFound(id) if id == "Matthew"));

    let keyless = OpenAITts::new(
        "",
        OpenAITtsConfig {
            base_url: server.url("/v1/"),
            ..OpenAITtsConfig::default()
        },
    )
    .unwrap();
    let err = keyless
        .synthesize(SynthesisRequest::new("Hello", "nova", "en-US", Engine::Neural))
        .await
        .unwrap_err();
    assert!(matches!(err, SpeechError::AuthError(_)));
}

#[tokio::test]
async fn test_list_voices_filters_by_language() {
    let server = MockServer::start_async().await;
    let mut catalog = nl_catalog();
    catalog.push(VoiceProfile::new("Joanna", "en-US"));
    let provider = provider_for(&server, catalog);

    let dutch = provider.list_voices("nl-NL").await.unwrap();
    assert_eq!(dutch.len(), 3);
    assert!(dutch.iter().all(|v| v.language_code == "nl-NL"));

    let icelandic = provider.list_voices("is-IS").await.unwrap();
    assert!(icelandic.is_empty());
}
