//! Scheduler state types

use crate::conversation::{Role, SummaryScope, TurnRange};
use serde::{Deserialize, Serialize};

/// Where the run currently stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchedulerState {
    /// Participant A speaks next
    #[default]
    AwaitingA,

    /// Participant B speaks next
    AwaitingB,

    /// A summary is owed before anything else happens
    AwaitingSummary {
        scope: SummaryScope,
        range: TurnRange,
        /// The participant whose turn triggered the summary
        after: Role,
    },

    /// Absorbing; nothing further is scheduled
    Terminated,
}

impl SchedulerState {
    pub fn awaiting(role: Role) -> Option<Self> {
        match role {
            Role::ParticipantA => Some(SchedulerState::AwaitingA),
            Role::ParticipantB => Some(SchedulerState::AwaitingB),
            Role::Summarizer => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SchedulerState::Terminated)
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerState::AwaitingA => "awaiting_a",
            SchedulerState::AwaitingB => "awaiting_b",
            SchedulerState::AwaitingSummary { .. } => "awaiting_summary",
            SchedulerState::Terminated => "terminated",
        }
    }
}

/// Immutable run configuration the transitions consult
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerContext {
    pub max_turns: u32,
    pub summary_interval: u32,
}

impl SchedulerContext {
    pub fn new(max_turns: u32, summary_interval: u32) -> Self {
        Self {
            max_turns,
            summary_interval,
        }
    }

    /// Whether any periodic summary can fire before the final one
    pub fn has_periodic_summaries(&self) -> bool {
        self.summary_interval < self.max_turns
    }
}
