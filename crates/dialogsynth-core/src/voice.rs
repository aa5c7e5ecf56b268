//! Picking the agent and customer voices for one conversation.

use crate::error::{PipelineError, Result};
use crate::labels::Speaker;
use crate::random::RandomSource;
use dialogsynth_speech::{Engine, Gender, VoiceProfile};

/// Voices chosen for one conversation
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceAssignment {
    pub agent: VoiceProfile,
    pub customer: VoiceProfile,
    /// Requested engine; each voice falls back to standard if it lacks it
    pub engine: Engine,
}

impl VoiceAssignment {
    pub fn voice_for(&self, speaker: Speaker) -> &VoiceProfile {
        match speaker {
            Speaker::Agent => &self.agent,
            Speaker::Customer => &self.customer,
        }
    }

    /// Engine that will actually be requested for `speaker`'s turns.
    pub fn engine_for(&self, speaker: Speaker) -> Engine {
        self.voice_for(speaker).engine_for(self.engine)
    }

    /// Both roles share one voice (single-voice languages)
    pub fn is_shared(&self) -> bool {
        self.agent.id == self.customer.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionOptions {
    pub preferred_engine: Engine,
    /// Prefer a customer voice of the other gender than the agent's
    pub prefer_mixed_gender: bool,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            preferred_engine: Engine::Neural,
            prefer_mixed_gender: true,
        }
    }
}

fn contrasting(a: Option<Gender>, b: Option<Gender>) -> bool {
    matches!(
        (a, b),
        (Some(Gender::Female), Some(Gender::Male)) | (Some(Gender::Male), Some(Gender::Female))
    )
}

/// Choose two distinct voices for `language_code` from `candidates`.
///
/// Voices supporting the preferred engine are used when at least two exist;
/// otherwise every voice speaking the language is eligible. A language with a
/// single voice gets that voice for both roles.
pub fn select_voices(
    language_code: &str,
    candidates: &[VoiceProfile],
    options: &SelectionOptions,
    rng: &RandomSource,
) -> Result<VoiceAssignment> {
    let matching: Vec<&VoiceProfile> = candidates
        .iter()
        .filter(|voice| voice.speaks(language_code))
        .collect();

    if matching.is_empty() {
        return Err(PipelineError::NoVoicesAvailable {
            language: language_code.to_string(),
        });
    }

    let preferred: Vec<&VoiceProfile> = matching
        .iter()
        .copied()
        .filter(|voice| voice.supports(options.preferred_engine))
        .collect();

    let eligible = if preferred.len() >= 2 {
        preferred
    } else {
        log::debug!(
            "Fewer than two {} voices for {}, using all {} voices",
            options.preferred_engine,
            language_code,
            matching.len()
        );
        matching
    };

    let agent = eligible[rng.index(eligible.len())];

    let others: Vec<&VoiceProfile> = eligible
        .iter()
        .copied()
        .filter(|voice| voice.id != agent.id)
        .collect();

    let customer = if others.is_empty() {
        log::warn!(
            "Only one voice ({}) available for {}, both speakers will share it",
            agent.id,
            language_code
        );
        agent
    } else {
        let contrasting_voices: Vec<&VoiceProfile> = if options.prefer_mixed_gender {
            others
                .iter()
                .copied()
                .filter(|voice| contrasting(agent.gender, voice.gender))
                .collect()
        } else {
            Vec::new()
        };
        let pool = if contrasting_voices.is_empty() {
            &others
        } else {
            &contrasting_voices
        };
        pool[rng.index(pool.len())]
    };

    let assignment = VoiceAssignment {
        agent: agent.clone(),
        customer: customer.clone(),
        engine: options.preferred_engine,
    };

    log::info!(
        "Voices for {}: agent={} ({}), customer={} ({})",
        language_code,
        assignment.agent.id,
        assignment.engine_for(Speaker::Agent),
        assignment.customer.id,
        assignment.engine_for(Speaker::Customer)
    );

    Ok(assignment)
}
