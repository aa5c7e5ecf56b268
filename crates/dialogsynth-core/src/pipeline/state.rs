use std::fmt;

/// Lifecycle of one conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    Pending,
    Parsed,
    VoicesSelected,
    Synthesizing,
    Assembled,
    Done,
    Failed(String),
}

impl ConversationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationState::Done | ConversationState::Failed(_))
    }

    fn can_advance_to(&self, next: &ConversationState) -> bool {
        use ConversationState::*;
        match (self, next) {
            (Done | Failed(_), _) => false,
            (_, Failed(_)) => true,
            (Pending, Parsed)
            | (Parsed, VoicesSelected)
            | (VoicesSelected, Synthesizing)
            | (Synthesizing, Assembled)
            | (Assembled, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationState::Pending => write!(f, "pending"),
            ConversationState::Parsed => write!(f, "parsed"),
            ConversationState::VoicesSelected => write!(f, "voices_selected"),
            ConversationState::Synthesizing => write!(f, "synthesizing"),
            ConversationState::Assembled => write!(f, "assembled"),
            ConversationState::Done => write!(f, "done"),
            ConversationState::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Tracks and logs the state of one conversation
#[derive(Debug)]
pub struct StateTracker {
    label: String,
    state: ConversationState,
    history: Vec<ConversationState>,
}

impl StateTracker {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: ConversationState::Pending,
            history: vec![ConversationState::Pending],
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Every state visited so far, starting with `Pending`
    pub fn history(&self) -> &[ConversationState] {
        &self.history
    }

    /// Move to `next`. Out-of-order transitions are logged and ignored.
    pub fn advance(&mut self, next: ConversationState) {
        if !self.state.can_advance_to(&next) {
            log::warn!(
                "[{}] ignoring transition {} -> {}",
                self.label,
                self.state,
                next
            );
            return;
        }
        match &next {
            ConversationState::Failed(_) => {
                log::warn!("[{}] {} -> {}", self.label, self.state, next)
            }
            _ => log::debug!("[{}] {} -> {}", self.label, self.state, next),
        }
        self.state = next.clone();
        self.history.push(next);
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.advance(ConversationState::Failed(reason.into()));
    }
}
