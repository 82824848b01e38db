//! Conversation record
//!
//! Append-only history of participant turns and summaries, plus the counters
//! the scheduler relies on.

mod error;
mod state;
mod turn;

pub use error::{ConversationError, GenerationFailure};
pub use state::{ConversationState, RunMetadata};
pub use turn::{Role, Summary, SummaryFields, SummaryScope, Turn, TurnRange};
