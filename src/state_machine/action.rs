//! Actions the driver carries out for a scheduler state

use super::SchedulerState;
use crate::conversation::{Role, SummaryScope, TurnRange};

/// The single next thing the driver must do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Ask a participant for its next utterance
    Speak { role: Role },
    /// Ask the summarizer to cover `range`
    Summarize { scope: SummaryScope, range: TurnRange },
    /// The run is over
    Stop,
}

impl From<&SchedulerState> for Action {
    fn from(state: &SchedulerState) -> Self {
        match state {
            SchedulerState::AwaitingA => Action::Speak {
                role: Role::ParticipantA,
            },
            SchedulerState::AwaitingB => Action::Speak {
                role: Role::ParticipantB,
            },
            SchedulerState::AwaitingSummary { scope, range, .. } => Action::Summarize {
                scope: *scope,
                range: *range,
            },
            SchedulerState::Terminated => Action::Stop,
        }
    }
}
