//! Conversation requests and parsed conversations.

use crate::labels::SpeakerLabels;
use crate::prompt::{DomainCatalog, Sentiment};
use crate::random::RandomSource;
use crate::transcript::{ParseError, Turn, parse_transcript, render_transcript};
use serde::{Deserialize, Serialize};

/// What the caller asks for. Unset fields are drawn at random.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversationRequest {
    pub language_code: String,
    pub sentiment: Option<Sentiment>,
    pub domain: Option<String>,
    pub topic: Option<String>,
}

impl ConversationRequest {
    pub fn new(language_code: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            ..Self::default()
        }
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Fill every unset attribute from the catalog and the random source.
    pub fn resolve(&self, catalog: &DomainCatalog, rng: &RandomSource) -> ConversationSpec {
        let sentiment = self.sentiment.unwrap_or_else(|| Sentiment::random(rng));
        let domain = self
            .domain
            .clone()
            .unwrap_or_else(|| catalog.random_domain(rng));
        let topic = self
            .topic
            .clone()
            .unwrap_or_else(|| catalog.random_topic(&domain, rng));
        ConversationSpec {
            language_code: self.language_code.clone(),
            domain,
            topic,
            sentiment,
        }
    }
}

/// Fully resolved conversation attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSpec {
    pub language_code: String,
    pub domain: String,
    pub topic: String,
    pub sentiment: Sentiment,
}

impl std::fmt::Display for ConversationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{} ({})",
            self.language_code, self.domain, self.sentiment, self.topic
        )
    }
}

/// A parsed conversation. Immutable once built.
#[derive(Debug, Clone)]
pub struct Conversation {
    spec: ConversationSpec,
    raw_text: String,
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn parse(
        spec: ConversationSpec,
        raw_text: impl Into<String>,
        labels: &SpeakerLabels,
    ) -> Result<Self, ParseError> {
        let raw_text = raw_text.into();
        let turns = parse_transcript(&raw_text, labels)?;
        Ok(Self {
            spec,
            raw_text,
            turns,
        })
    }

    pub fn spec(&self) -> &ConversationSpec {
        &self.spec
    }

    pub fn language_code(&self) -> &str {
        &self.spec.language_code
    }

    pub fn sentiment(&self) -> Sentiment {
        self.spec.sentiment
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn transcript(&self, labels: &SpeakerLabels) -> String {
        render_transcript(&self.turns, labels)
    }
}
