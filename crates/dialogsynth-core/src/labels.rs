//! Speaker labels per language.
//!
//! The parser, the prompt builder and the transcript writer all consult the same
//! [`LabelTable`]. Adding a language is a data change: a `[labels.<code>]` entry
//! in the config file either adds a new language or replaces a built-in one.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Who speaks a turn
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Speaker {
    Agent,
    Customer,
}

impl Speaker {
    pub fn other(self) -> Self {
        match self {
            Speaker::Agent => Speaker::Customer,
            Speaker::Customer => Speaker::Agent,
        }
    }
}

/// Accepted labels for both speakers of one language.
///
/// The first entry of each list is canonical: it is what prompts ask the model
/// to write and what emitted transcripts use. Later entries are aliases the
/// parser also recognizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerLabels {
    pub agent: Vec<String>,
    pub customer: Vec<String>,
}

impl SpeakerLabels {
    pub fn new(agent: impl Into<String>, customer: impl Into<String>) -> Self {
        Self {
            agent: vec![agent.into()],
            customer: vec![customer.into()],
        }
    }

    pub fn with_agent_alias(mut self, alias: impl Into<String>) -> Self {
        self.agent.push(alias.into());
        self
    }

    pub fn with_customer_alias(mut self, alias: impl Into<String>) -> Self {
        self.customer.push(alias.into());
        self
    }

    /// Canonical label for `speaker`.
    pub fn canonical(&self, speaker: Speaker) -> &str {
        let labels = match speaker {
            Speaker::Agent => &self.agent,
            Speaker::Customer => &self.customer,
        };
        labels.first().map(String::as_str).unwrap_or_default()
    }

    /// Every label paired with its speaker, longest first so that a label
    /// which prefixes another never shadows it.
    pub fn candidates(&self) -> Vec<(Speaker, &str)> {
        let mut all: Vec<(Speaker, &str)> = self
            .agent
            .iter()
            .map(|label| (Speaker::Agent, label.as_str()))
            .chain(
                self.customer
                    .iter()
                    .map(|label| (Speaker::Customer, label.as_str())),
            )
            .filter(|(_, label)| !label.trim().is_empty())
            .collect();
        all.sort_by_key(|(_, label)| std::cmp::Reverse(label.chars().count()));
        all
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.agent.iter().all(|l| l.trim().is_empty()) {
            return Err("at least one agent label is required".to_string());
        }
        if self.customer.iter().all(|l| l.trim().is_empty()) {
            return Err("at least one customer label is required".to_string());
        }
        for agent in &self.agent {
            if self
                .customer
                .iter()
                .any(|customer| customer.to_lowercase() == agent.to_lowercase())
            {
                return Err(format!("label '{agent}' is used for both speakers"));
            }
        }
        Ok(())
    }

    /// Also accept the English labels, which models often fall back to.
    fn with_english_aliases(self) -> Self {
        let agent_known = self.agent.iter().any(|l| l.eq_ignore_ascii_case("Agent"));
        let customer_known = self
            .customer
            .iter()
            .any(|l| l.eq_ignore_ascii_case("Customer"));
        let labels = if agent_known {
            self
        } else {
            self.with_agent_alias("Agent")
        };
        if customer_known {
            labels
        } else {
            labels.with_customer_alias("Customer")
        }
    }
}

/// Language code to speaker labels, with an English fallback
#[derive(Debug, Clone)]
pub struct LabelTable {
    entries: HashMap<String, SpeakerLabels>,
    fallback: SpeakerLabels,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LabelTable {
    /// Labels for every language the tool ships prompts for.
    pub fn builtin() -> Self {
        let english = SpeakerLabels::new("Agent", "Customer");
        let mut table = Self {
            entries: HashMap::new(),
            fallback: english.clone(),
        };
        table.insert("en", english);

        let localized = [
            ("fr", SpeakerLabels::new("Agent", "Client")),
            ("de", SpeakerLabels::new("Agent", "Kunde")),
            ("nl", SpeakerLabels::new("Agent", "Klant")),
            ("it", SpeakerLabels::new("Agente", "Cliente")),
            ("es", SpeakerLabels::new("Agente", "Cliente")),
            ("pt", SpeakerLabels::new("Agente", "Cliente")),
            ("ro", SpeakerLabels::new("Agent", "Client")),
            (
                "ja",
                SpeakerLabels::new("担当者", "顧客").with_agent_alias("代理店"),
            ),
            ("da", SpeakerLabels::new("Agent", "Kunde")),
            ("fi", SpeakerLabels::new("Asiakaspalvelija", "Asiakas")),
            ("is", SpeakerLabels::new("Þjónustufulltrúi", "Viðskiptavinur")),
            ("nb", SpeakerLabels::new("Agent", "Kunde")),
            ("sv", SpeakerLabels::new("Agent", "Kund")),
            ("pl", SpeakerLabels::new("Agent", "Klient")),
            ("cy", SpeakerLabels::new("Asiant", "Cwsmer")),
        ];
        for (code, labels) in localized {
            table.insert(code, labels.with_english_aliases());
        }
        table
    }

    /// Built-in table with config-file entries layered on top.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, SpeakerLabels>) -> Self {
        for (code, labels) in overrides {
            self.insert(code, labels.clone());
        }
        self
    }

    pub fn insert(&mut self, language_code: &str, labels: SpeakerLabels) {
        self.entries
            .insert(language_code.to_ascii_lowercase(), labels);
    }

    /// Exact code first, then the primary subtag, then English.
    pub fn lookup(&self, language_code: &str) -> &SpeakerLabels {
        let code = language_code.to_ascii_lowercase();
        if let Some(labels) = self.entries.get(&code) {
            return labels;
        }
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        self.entries.get(primary).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, language_code: &str) -> bool {
        let code = language_code.to_ascii_lowercase();
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        self.entries.contains_key(&code) || self.entries.contains_key(primary)
    }
}
