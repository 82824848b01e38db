//! Turn orchestration state machine
//!
//! Pure transitions decide who speaks next, when a summary is owed, and when
//! the run stops. [`TurnScheduler`] holds the current state and is the only
//! thing the driver asks.

mod action;
pub mod event;
pub mod state;
pub(crate) mod transition;
mod scheduler;

#[cfg(test)]
mod proptests;

pub use action::Action;
pub use event::Event;
pub use scheduler::TurnScheduler;
pub use state::{SchedulerContext, SchedulerState};
pub use transition::{transition, TransitionError, TransitionResult};
