use super::schema::Config;
use crate::error::ConfigError;

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_pipeline(config)?;
    validate_retry(config)?;

    config
        .generation
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("generation: {}", e)))?;

    if config.speech.max_input_chars == 0 {
        return Err(ConfigError::ValidationError(
            "speech.max_input_chars must be greater than 0".to_string(),
        ));
    }

    for (code, labels) in &config.labels {
        labels
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("labels.{}: {}", code, e)))?;
    }

    for (domain, topics) in &config.domains {
        if topics.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "domains.{} must list at least one topic",
                domain
            )));
        }
    }

    Ok(())
}

fn validate_pipeline(config: &Config) -> Result<(), ConfigError> {
    let pipeline = &config.pipeline;
    if pipeline.max_concurrent_conversations == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_concurrent_conversations must be greater than 0".to_string(),
        ));
    }
    if pipeline.max_concurrent_turns == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_concurrent_turns must be greater than 0".to_string(),
        ));
    }
    if pipeline.output_sample_rate == Some(0) {
        return Err(ConfigError::ValidationError(
            "pipeline.output_sample_rate must be greater than 0".to_string(),
        ));
    }
    pipeline
        .silence
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("pipeline.{}", e)))
}

fn validate_retry(config: &Config) -> Result<(), ConfigError> {
    let retry = &config.retry;
    if retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "retry.max_attempts must be at least 1".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&retry.jitter_ratio) {
        return Err(ConfigError::ValidationError(format!(
            "retry.jitter_ratio must be within 0.0..=1.0, got {}",
            retry.jitter_ratio
        )));
    }
    if retry.base_delay_ms > retry.max_delay_ms {
        return Err(ConfigError::ValidationError(format!(
            "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
            retry.base_delay_ms, retry.max_delay_ms
        )));
    }
    Ok(())
}
