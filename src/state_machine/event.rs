//! Events that advance the scheduler

use crate::conversation::{Role, TurnRange};

/// Something the driver finished doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A participant's turn was recorded; `turn_count` is the conversational
    /// count after that turn
    TurnCompleted { role: Role, turn_count: u32 },

    /// The owed summary for `range` was recorded
    SummaryCompleted { range: TurnRange },
}
