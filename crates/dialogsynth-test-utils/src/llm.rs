use async_trait::async_trait;
use dialogsynth_llm::{GenerationError, GenerationResult, TextGenerator};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

/// Text generator answering from a script.
///
/// Rules are matched in insertion order against the prompt; the first rule
/// whose needle occurs in the prompt decides the reply, otherwise the default
/// transcript is returned.
#[derive(Debug)]
pub struct MockTextGenerator {
    default: String,
    rules: Vec<(String, Reply)>,
    transient_failures: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            rules: Vec::new(),
            transient_failures: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `text` when the prompt contains `needle`
    pub fn respond_when(mut self, needle: &str, text: impl Into<String>) -> Self {
        self.rules.push((needle.to_string(), Reply::Text(text.into())));
        self
    }

    /// Fail permanently when the prompt contains `needle`
    pub fn fail_when(mut self, needle: &str, message: impl Into<String>) -> Self {
        self.rules.push((needle.to_string(), Reply::Fail(message.into())));
        self
    }

    /// Throttle the next `count` calls
    pub fn with_transient_failures(self, count: usize) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Every prompt received, in arrival order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    fn backend_name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, prompt: &str) -> GenerationResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(GenerationError::Transient {
                message: "scripted rate limit".to_string(),
                retry_after: Some(Duration::ZERO),
            });
        }

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::Text(self.default.clone()));

        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail(message) => Err(GenerationError::ProviderError(message)),
        }
    }
}
