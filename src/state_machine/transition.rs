//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! result and performs no I/O.

use super::{Action, Event, SchedulerContext, SchedulerState};
use crate::conversation::{Role, SummaryScope, TurnRange};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: SchedulerState,
    pub next: Action,
}

impl TransitionResult {
    pub fn new(state: SchedulerState) -> Self {
        let next = Action::from(&state);
        Self {
            new_state: state,
            next,
        }
    }
}

/// Events that do not fit the current state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("expected {expected} to speak, got {actual}")]
    UnexpectedSpeaker { expected: Role, actual: Role },
    #[error("summary for turns {range} must be produced first")]
    SummaryPending { range: TurnRange },
    #[error("no summary is pending")]
    NoSummaryPending,
    #[error("summary covered turns {actual}, expected {expected}")]
    RangeMismatch { expected: TurnRange, actual: TurnRange },
    #[error("turn count {turn_count} is outside 1..={max_turns}")]
    TurnOutOfBounds { turn_count: u32, max_turns: u32 },
    #[error("run already terminated")]
    Terminated,
}

/// Pure transition function
pub fn transition(
    state: &SchedulerState,
    context: &SchedulerContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Participant turns
        // ============================================================
        (SchedulerState::AwaitingA, Event::TurnCompleted { role, turn_count })
        | (SchedulerState::AwaitingB, Event::TurnCompleted { role, turn_count }) => {
            let expected = match state {
                SchedulerState::AwaitingA => Role::ParticipantA,
                _ => Role::ParticipantB,
            };
            if role != expected {
                return Err(TransitionError::UnexpectedSpeaker {
                    expected,
                    actual: role,
                });
            }
            if turn_count == 0 || turn_count > context.max_turns {
                return Err(TransitionError::TurnOutOfBounds {
                    turn_count,
                    max_turns: context.max_turns,
                });
            }
            Ok(TransitionResult::new(after_turn(role, turn_count, context)))
        }

        (SchedulerState::AwaitingSummary { range, .. }, Event::TurnCompleted { .. }) => {
            Err(TransitionError::SummaryPending { range: *range })
        }

        // ============================================================
        // Summaries
        // ============================================================
        (
            SchedulerState::AwaitingSummary {
                scope,
                range: expected,
                after,
            },
            Event::SummaryCompleted { range },
        ) => {
            if range != *expected {
                return Err(TransitionError::RangeMismatch {
                    expected: *expected,
                    actual: range,
                });
            }
            match scope {
                SummaryScope::Final => Ok(TransitionResult::new(SchedulerState::Terminated)),
                SummaryScope::Periodic => {
                    let resume = after
                        .partner()
                        .and_then(SchedulerState::awaiting)
                        .unwrap_or(SchedulerState::AwaitingA);
                    Ok(TransitionResult::new(resume))
                }
            }
        }

        (SchedulerState::AwaitingA | SchedulerState::AwaitingB, Event::SummaryCompleted { .. }) => {
            Err(TransitionError::NoSummaryPending)
        }

        // ============================================================
        // Terminated is absorbing
        // ============================================================
        (SchedulerState::Terminated, _) => Err(TransitionError::Terminated),
    }
}

/// Where to go after `role` took turn number `turn_count`
///
/// Reaching `max_turns` always owes the final summary, even when the turn is
/// also a multiple of the interval.
fn after_turn(role: Role, turn_count: u32, context: &SchedulerContext) -> SchedulerState {
    if turn_count == context.max_turns {
        return SchedulerState::AwaitingSummary {
            scope: SummaryScope::Final,
            range: TurnRange::new(1, turn_count),
            after: role,
        };
    }
    if context.summary_interval > 0 && turn_count % context.summary_interval == 0 {
        return SchedulerState::AwaitingSummary {
            scope: SummaryScope::Periodic,
            range: TurnRange::trailing(turn_count, context.summary_interval),
            after: role,
        };
    }
    role.partner()
        .and_then(SchedulerState::awaiting)
        .unwrap_or(SchedulerState::AwaitingA)
}
