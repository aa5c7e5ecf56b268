use super::schema::Config;
use crate::error::ConfigError;
use std::path::Path;

pub fn parse_toml_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_toml_str(&content)
}

pub fn parse_toml_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogsynth_llm::GeneratorBackend;
    use dialogsynth_speech::Engine;
    use std::io::Write;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_toml_str("").unwrap();
        assert_eq!(config.pipeline.max_concurrent_conversations, 2);
        assert_eq!(config.pipeline.max_concurrent_turns, 4);
        assert_eq!(config.pipeline.preferred_engine, Engine::Neural);
        assert_eq!(config.pipeline.silence.min_ms, 300);
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.generation.backend, GeneratorBackend::OpenAI);
        assert!(config.labels.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[generation]
backend = "anthropic"
model = "claude-3-5-haiku-latest"
temperature = 0.9

[speech]
base_url = "http://localhost:8880/v1/"
max_input_chars = 1000

[[speech.voices]]
id = "af_heart"
language_code = "en-US"
supported_engines = ["standard"]
gender = "female"

[pipeline]
max_concurrent_turns = 8
preferred_engine = "standard"
silence = { min_ms = 500, max_ms = 500 }
output_sample_rate = 16000
seed = 42

[retry]
max_attempts = 2
jitter_ratio = 0.0

[labels.cy]
agent = ["Asiant"]
customer = ["Cwsmer"]

[domains]
shipping = ["late parcel", "damaged box"]
"#;
        let config = parse_toml_str(toml).unwrap();
        assert_eq!(config.generation.backend, GeneratorBackend::Anthropic);
        assert_eq!(config.speech.max_input_chars, 1000);
        assert_eq!(config.speech.voices.len(), 1);
        assert_eq!(config.speech.voices[0].id, "af_heart");
        assert_eq!(config.pipeline.max_concurrent_turns, 8);
        assert_eq!(config.pipeline.max_concurrent_conversations, 2);
        assert_eq!(config.pipeline.preferred_engine, Engine::Standard);
        assert_eq!(config.pipeline.silence.max_ms, 500);
        assert_eq!(config.pipeline.output_sample_rate, Some(16_000));
        assert_eq!(config.pipeline.seed, Some(42));
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.base_delay_ms, 250);
        assert_eq!(config.labels["cy"].agent, vec!["Asiant".to_string()]);
        assert_eq!(config.domains["shipping"].len(), 2);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = parse_toml_str("[pipeline\nseed = 1").unwrap_err();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nmax_concurrent_conversations = 5").unwrap();
        let config = parse_toml_file(file.path()).unwrap();
        assert_eq!(config.pipeline.max_concurrent_conversations, 5);

        assert!(matches!(
            parse_toml_file("/definitely/not/here.toml"),
            Err(ConfigError::IoError(_))
        ));
    }
}
