//! Conversation error taxonomy

use super::{Role, SummaryScope, TurnRange};
use crate::llm::LlmError;
use crate::state_machine::TransitionError;
use thiserror::Error;

/// Errors raised while recording or driving a conversation
#[derive(Debug, Error)]
pub enum ConversationError {
    /// A turn arrived out of the A, B, A, B alternation (or while a summary
    /// was owed). Always a programming error.
    #[error("invalid speaker order: expected {expected}, got {actual}")]
    InvalidSpeakerOrder { expected: Role, actual: Role },

    #[error("turn limit of {max_turns} already reached")]
    TurnLimitReached { max_turns: u32 },

    #[error("summary range {range} is empty or outside the {recorded} recorded turns")]
    EmptyRange { range: TurnRange, recorded: u32 },

    #[error("summary range {range} overlaps an existing {scope} summary")]
    OverlappingSummary { range: TurnRange, scope: SummaryScope },

    /// A summary that the schedule does not call for at this turn count
    #[error("no {scope} summary of turns {range} is owed after {recorded} turns")]
    UnexpectedSummary {
        range: TurnRange,
        scope: SummaryScope,
        recorded: u32,
    },

    #[error("restored history is inconsistent: {0}")]
    InconsistentHistory(String),

    #[error("scheduler rejected step: {0}")]
    Scheduler(#[from] TransitionError),

    #[error(transparent)]
    Generation(#[from] GenerationFailure),
}

/// A remote generation call failed for `role`
#[derive(Debug, Error)]
#[error("{role} failed to generate: {source}")]
pub struct GenerationFailure {
    pub role: Role,
    #[source]
    pub source: LlmError,
}

impl GenerationFailure {
    pub fn new(role: Role, source: LlmError) -> Self {
        Self { role, source }
    }
}
