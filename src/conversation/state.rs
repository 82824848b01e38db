//! Append-only conversation state

use super::{ConversationError, Role, Summary, SummaryFields, SummaryScope, Turn, TurnRange};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Run-level facts carried alongside the history for exporters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub topic: String,
    pub max_turns: u32,
    pub summary_interval: u32,
    /// Display label of participant A (e.g. "Participant A (gpt-4o)")
    pub participant_a: String,
    pub participant_b: String,
    pub summarizer: String,
}

impl RunMetadata {
    pub fn label(&self, role: Role) -> &str {
        match role {
            Role::ParticipantA => &self.participant_a,
            Role::ParticipantB => &self.participant_b,
            Role::Summarizer => &self.summarizer,
        }
    }
}

/// Ordered record of one run
///
/// Turns are kept in insertion order and never reordered. Participant turns
/// must alternate A, B, A, B starting with A, and a turn that lands on a
/// multiple of `summary_interval` must be followed by its summary before
/// the next participant turn is accepted.
///
/// Deserializing replays the stored turn log, so a snapshot whose counter,
/// alternation or summary ranges disagree with its turns is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredConversation")]
pub struct ConversationState {
    metadata: RunMetadata,
    turns: Vec<Turn>,
    summaries: Vec<Summary>,
    turn_count: u32,
}

impl ConversationState {
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            metadata,
            turns: Vec::new(),
            summaries: Vec::new(),
            turn_count: 0,
        }
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn topic(&self) -> &str {
        &self.metadata.topic
    }

    /// All recorded turns in chronological order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// All recorded summaries in the order they were produced
    pub fn summaries(&self) -> &[Summary] {
        &self.summaries
    }

    /// Number of participant turns taken so far
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn final_summary(&self) -> Option<&Summary> {
        self.summaries
            .iter()
            .find(|s| s.scope == SummaryScope::Final)
    }

    pub fn periodic_summaries(&self) -> impl Iterator<Item = &Summary> {
        self.summaries
            .iter()
            .filter(|s| s.scope == SummaryScope::Periodic)
    }

    /// All turns taken and the closing summary recorded
    pub fn is_complete(&self) -> bool {
        self.turn_count >= self.metadata.max_turns && self.final_summary().is_some()
    }

    /// The summary owed for the current turn count, if any
    ///
    /// Reaching `max_turns` owes the final summary, which supersedes a
    /// periodic one landing on the same turn.
    pub fn pending_summary(&self) -> Option<(SummaryScope, TurnRange)> {
        let t = self.turn_count;
        if t == 0 {
            return None;
        }
        if t >= self.metadata.max_turns {
            return self
                .final_summary()
                .is_none()
                .then_some((SummaryScope::Final, TurnRange::new(1, t)));
        }
        let interval = self.metadata.summary_interval;
        if interval > 0 && t % interval == 0 {
            let already = self
                .periodic_summaries()
                .any(|s| s.range.end == t);
            if !already {
                return Some((SummaryScope::Periodic, TurnRange::trailing(t, interval)));
            }
        }
        None
    }

    /// The participant whose turn comes next, ignoring any owed summary
    pub fn next_participant(&self) -> Role {
        if self.turn_count % 2 == 0 {
            Role::ParticipantA
        } else {
            Role::ParticipantB
        }
    }

    /// Record a turn
    ///
    /// Participant turns are validated against the alternation and bump the
    /// turn counter. Summarizer notes are recorded as-is and leave the
    /// counter untouched.
    pub fn append_turn(
        &mut self,
        role: Role,
        content: impl Into<String>,
    ) -> Result<&Turn, ConversationError> {
        if role.is_conversational() {
            if self.turn_count >= self.metadata.max_turns {
                return Err(ConversationError::TurnLimitReached {
                    max_turns: self.metadata.max_turns,
                });
            }
            if self.pending_summary().is_some() {
                return Err(ConversationError::InvalidSpeakerOrder {
                    expected: Role::Summarizer,
                    actual: role,
                });
            }
            let expected = self.next_participant();
            if role != expected {
                return Err(ConversationError::InvalidSpeakerOrder {
                    expected,
                    actual: role,
                });
            }
            self.turn_count += 1;
        }

        self.turns.push(Turn {
            sequence: self.turn_count,
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
        Ok(&self.turns[self.turns.len() - 1])
    }

    /// Record a summary for `range`
    ///
    /// The range must be non-empty and fall within recorded turns. Periodic
    /// summaries may not overlap one another, and only one final summary
    /// may exist. Beyond that, `(scope, range)` must be exactly the summary
    /// [`pending_summary`](Self::pending_summary) reports as owed.
    pub fn append_summary(
        &mut self,
        fields: SummaryFields,
        range: TurnRange,
        scope: SummaryScope,
    ) -> Result<&Summary, ConversationError> {
        if range.is_empty() || range.end > self.turn_count {
            return Err(ConversationError::EmptyRange {
                range,
                recorded: self.turn_count,
            });
        }

        let clash = self.summaries.iter().any(|existing| {
            existing.scope == scope
                && match scope {
                    SummaryScope::Final => true,
                    SummaryScope::Periodic => existing.range.overlaps(&range),
                }
        });
        if clash {
            return Err(ConversationError::OverlappingSummary { range, scope });
        }

        if self.pending_summary() != Some((scope, range)) {
            return Err(ConversationError::UnexpectedSummary {
                range,
                scope,
                recorded: self.turn_count,
            });
        }

        self.summaries.push(Summary {
            range,
            scope,
            fields,
            created_at: Utc::now(),
        });
        Ok(&self.summaries[self.summaries.len() - 1])
    }

    /// The last `window` turns, or all of them when `window` is `None`
    pub fn render_context(&self, window: Option<usize>) -> &[Turn] {
        let start = window.map_or(0, |w| self.turns.len().saturating_sub(w));
        &self.turns[start..]
    }

    /// Participant turns whose sequence falls inside `range`
    pub fn turns_in(&self, range: TurnRange) -> Vec<&Turn> {
        self.turns
            .iter()
            .filter(|t| t.role.is_conversational() && range.contains(t.sequence))
            .collect()
    }
}

/// Wire shape of [`ConversationState`], checked before it is trusted
#[derive(Deserialize)]
struct StoredConversation {
    metadata: RunMetadata,
    turns: Vec<Turn>,
    summaries: Vec<Summary>,
    turn_count: u32,
}

impl TryFrom<StoredConversation> for ConversationState {
    type Error = ConversationError;

    fn try_from(stored: StoredConversation) -> Result<Self, Self::Error> {
        let inconsistent = |reason: String| -> Result<Self, ConversationError> {
            Err(ConversationError::InconsistentHistory(reason))
        };

        let mut count = 0u32;
        for turn in &stored.turns {
            if turn.role.is_conversational() {
                count += 1;
                let expected = if count % 2 == 1 {
                    Role::ParticipantA
                } else {
                    Role::ParticipantB
                };
                if turn.role != expected {
                    return inconsistent(format!("turn {count} recorded for {}, expected {expected}", turn.role));
                }
            }
            if turn.sequence != count {
                return inconsistent(format!(
                    "{} entry numbered {} after {count} participant turns",
                    turn.role, turn.sequence
                ));
            }
        }

        if count > stored.metadata.max_turns {
            return inconsistent(format!(
                "{count} participant turns exceed the limit of {}",
                stored.metadata.max_turns
            ));
        }
        if stored.turn_count != count {
            return inconsistent(format!(
                "turn_count is {} but the log holds {count} participant turns",
                stored.turn_count
            ));
        }
        if let Some(summary) = stored
            .summaries
            .iter()
            .find(|s| s.range.is_empty() || s.range.end > count)
        {
            return inconsistent(format!(
                "{} summary of turns {} lies outside the {count} recorded turns",
                summary.scope, summary.range
            ));
        }

        Ok(Self {
            metadata: stored.metadata,
            turns: stored.turns,
            summaries: stored.summaries,
            turn_count: count,
        })
    }
}
