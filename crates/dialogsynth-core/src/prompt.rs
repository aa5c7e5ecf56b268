//! Prompt text, sentiments and the domain catalog.

use crate::conversation::ConversationSpec;
use crate::labels::{Speaker, SpeakerLabels};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// Language codes the `all-languages` batch covers
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "en-GB", "en-US", "nl-NL", "fr-FR", "de-DE", "it-IT", "pt-PT", "es-ES", "da-DK", "fi-FI",
    "is-IS", "nb-NO", "sv-SE", "pl-PL", "ro-RO", "cy-GB", "ja-JP",
];

/// Emotional framing requested for the customer persona
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Sentiment {
    Neutral,
    Angry,
    Frustrated,
    Excited,
    Happy,
    Sad,
    Disappointed,
    Confused,
}

impl Sentiment {
    pub fn random(rng: &RandomSource) -> Self {
        let all: Vec<Sentiment> = Sentiment::iter().collect();
        all[rng.index(all.len())]
    }

    /// Sentence describing the customer's mood, using the localized label.
    pub fn instruction(&self, customer_label: &str) -> String {
        match self {
            Sentiment::Angry => {
                format!("The {customer_label} is angry and frustrated about their issue.")
            }
            Sentiment::Frustrated => {
                format!("The {customer_label} is frustrated but trying to remain calm.")
            }
            Sentiment::Excited => format!(
                "The {customer_label} is excited and enthusiastic, even when discussing issues."
            ),
            Sentiment::Happy => {
                format!("The {customer_label} is happy and pleasant throughout the conversation.")
            }
            Sentiment::Sad => {
                format!("The {customer_label} is sad and disappointed about their situation.")
            }
            Sentiment::Disappointed => {
                format!("The {customer_label} is disappointed with the service they've received.")
            }
            Sentiment::Confused => {
                format!("The {customer_label} is confused and needs extra explanation.")
            }
            Sentiment::Neutral => format!("The {customer_label} has a neutral tone."),
        }
    }
}

/// English name of a language, by primary subtag. Unknown codes read as English.
pub fn language_name(language_code: &str) -> &'static str {
    let primary = language_code
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match primary.as_str() {
        "fr" => "French",
        "de" => "German",
        "nl" => "Dutch",
        "it" => "Italian",
        "es" => "Spanish",
        "pt" => "Portuguese",
        "ro" => "Romanian",
        "ja" => "Japanese",
        "da" => "Danish",
        "fi" => "Finnish",
        "is" => "Icelandic",
        "nb" | "no" => "Norwegian",
        "sv" => "Swedish",
        "pl" => "Polish",
        "cy" => "Welsh",
        _ => "English",
    }
}

/// Service domains and the topics a conversation in each may cover
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainCatalog {
    domains: BTreeMap<String, Vec<String>>,
}

impl Default for DomainCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DomainCatalog {
    /// Mobile-operator support topics
    pub fn builtin() -> Self {
        let entries: [(&str, [&str; 5]); 5] = [
            (
                "technical_support",
                [
                    "network connectivity issues",
                    "device setup assistance",
                    "software updates",
                    "account access problems",
                    "mobile app troubleshooting",
                ],
            ),
            (
                "billing_inquiries",
                [
                    "unexpected charges",
                    "payment methods",
                    "plan changes",
                    "billing cycle questions",
                    "disputing fees",
                ],
            ),
            (
                "plan_upgrades",
                [
                    "data plan options",
                    "international roaming",
                    "family plan setup",
                    "promotional offers",
                    "device upgrade eligibility",
                ],
            ),
            (
                "account_management",
                [
                    "adding new lines",
                    "changing personal information",
                    "account security",
                    "cancellation requests",
                    "switching to paperless billing",
                ],
            ),
            (
                "general_inquiries",
                [
                    "store locations",
                    "coverage area questions",
                    "new customer onboarding",
                    "warranty information",
                    "device trade-in process",
                ],
            ),
        ];

        Self {
            domains: entries
                .into_iter()
                .map(|(domain, topics)| {
                    (
                        domain.to_string(),
                        topics.iter().map(|t| t.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Catalog from config; domains without topics are dropped.
    pub fn from_map(domains: &BTreeMap<String, Vec<String>>) -> Option<Self> {
        let domains: BTreeMap<String, Vec<String>> = domains
            .iter()
            .filter(|(_, topics)| !topics.is_empty())
            .map(|(d, t)| (d.clone(), t.clone()))
            .collect();
        if domains.is_empty() {
            None
        } else {
            Some(Self { domains })
        }
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn topics(&self, domain: &str) -> Option<&[String]> {
        self.domains.get(domain).map(Vec::as_slice)
    }

    pub fn random_domain(&self, rng: &RandomSource) -> String {
        let names: Vec<&String> = self.domains.keys().collect();
        names[rng.index(names.len())].clone()
    }

    /// A topic of `domain`; unknown domains use their own name as the topic.
    pub fn random_topic(&self, domain: &str, rng: &RandomSource) -> String {
        match self.topics(domain) {
            Some(topics) if !topics.is_empty() => topics[rng.index(topics.len())].clone(),
            _ => domain.replace('_', " "),
        }
    }
}

/// Prompt asking the generator for one labeled conversation.
pub fn build_prompt(spec: &ConversationSpec, labels: &SpeakerLabels) -> String {
    let agent = labels.canonical(Speaker::Agent);
    let customer = labels.canonical(Speaker::Customer);
    format!(
        "Create a realistic customer service conversation in {language} between a mobile company {agent} and a {customer} about {topic}.\n\
         The conversation should be between 60-600 seconds when spoken.\n\
         {sentiment}\n\
         Format the conversation as follows:\n\
         {agent}: [Agent's dialogue]\n\
         {customer}: [Customer's dialogue]\n",
        language = language_name(&spec.language_code),
        topic = spec.topic,
        sentiment = spec.sentiment.instruction(customer),
    )
}
