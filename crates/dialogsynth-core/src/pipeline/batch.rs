use super::{CompletedConversation, ConversationOutcome, FailedConversation, Pipeline};
use crate::conversation::ConversationRequest;
use futures::{StreamExt, stream};
use std::fmt;
use std::time::{Duration, Instant};

/// Result of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub completed: Vec<CompletedConversation>,
    pub failed: Vec<FailedConversation>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total audio produced by completed conversations
    pub fn audio_duration(&self) -> Duration {
        self.completed.iter().map(|c| c.duration).sum()
    }

    fn record(&mut self, outcome: ConversationOutcome) {
        match outcome {
            ConversationOutcome::Completed(done) => self.completed.push(done),
            ConversationOutcome::Failed(failed) => self.failed.push(failed),
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} of {} conversations completed in {:.1}s ({:.1}s of audio)",
            self.completed.len(),
            self.total(),
            self.elapsed.as_secs_f64(),
            self.audio_duration().as_secs_f64()
        )?;
        for done in &self.completed {
            writeln!(
                f,
                "  ok    {} -> {}",
                done.spec,
                done.artifacts.audio_path.display()
            )?;
        }
        for failed in &self.failed {
            writeln!(
                f,
                "  error {} [{}]: {}",
                failed.spec, failed.code, failed.reason
            )?;
        }
        Ok(())
    }
}

impl Pipeline {
    /// Run every request, at most `max_concurrent_conversations` at a time.
    ///
    /// A failing conversation never stops the others.
    pub async fn run_batch(&self, requests: Vec<ConversationRequest>) -> BatchReport {
        let started = Instant::now();
        let total = requests.len();
        log::info!(
            "Running {} conversations ({} concurrent)",
            total,
            self.max_concurrent_conversations
        );

        let mut outcomes = stream::iter(requests)
            .map(move |request| async move { self.run_conversation(&request).await })
            .buffer_unordered(self.max_concurrent_conversations);

        let mut report = BatchReport::default();
        while let Some(outcome) = outcomes.next().await {
            report.record(outcome);
            log::info!("Progress: {}/{}", report.total(), total);
        }
        report.elapsed = started.elapsed();
        report
    }
}
