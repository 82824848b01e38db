//! Stateful wrapper around the pure transition function

use super::{transition, Action, Event, SchedulerContext, SchedulerState, TransitionError};
use crate::conversation::{ConversationState, Role};

/// Holds the current scheduler state for one run
#[derive(Debug, Clone)]
pub struct TurnScheduler {
    state: SchedulerState,
    context: SchedulerContext,
}

impl TurnScheduler {
    /// A fresh scheduler, starting with participant A
    pub fn new(context: SchedulerContext) -> Self {
        Self {
            state: SchedulerState::AwaitingA,
            context,
        }
    }

    /// Scheduler positioned where `conversation` left off
    ///
    /// An empty conversation starts at `AwaitingA`; a restored one resumes at
    /// its owed summary or its next participant.
    pub fn for_conversation(conversation: &ConversationState) -> Self {
        let meta = conversation.metadata();
        let context = SchedulerContext::new(meta.max_turns, meta.summary_interval);

        let state = if conversation.is_complete() {
            SchedulerState::Terminated
        } else if let Some((scope, range)) = conversation.pending_summary() {
            let after = conversation
                .turns()
                .iter()
                .rev()
                .find(|t| t.role.is_conversational())
                .map_or(Role::ParticipantA, |t| t.role);
            SchedulerState::AwaitingSummary {
                scope,
                range,
                after,
            }
        } else {
            SchedulerState::awaiting(conversation.next_participant())
                .unwrap_or(SchedulerState::AwaitingA)
        };

        Self { state, context }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn context(&self) -> &SchedulerContext {
        &self.context
    }

    pub fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }

    /// What the driver should do next
    pub fn next_action(&self) -> Action {
        Action::from(&self.state)
    }

    /// Apply `event`, returning the next action
    ///
    /// A rejected event leaves the state untouched.
    pub fn advance(&mut self, event: Event) -> Result<Action, TransitionError> {
        let result = transition(&self.state, &self.context, event)?;
        tracing::debug!(
            from = self.state.name(),
            to = result.new_state.name(),
            "Scheduler transition"
        );
        self.state = result.new_state;
        Ok(result.next)
    }
}
