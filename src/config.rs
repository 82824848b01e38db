//! Run configuration consumed by the conversation core

use crate::conversation::RunMetadata;
use crate::state_machine::SchedulerContext;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("max_turns must be at least 1")]
    ZeroMaxTurns,

    #[error("summary_interval must be at least 1")]
    ZeroSummaryInterval,

    #[error("history_window must be at least 1 when set")]
    ZeroHistoryWindow,
}

/// Parameters of a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub topic: String,
    pub max_turns: u32,
    pub summary_interval: u32,
    /// Most recent turns shown to participants; `None` shows everything
    pub history_window: Option<usize>,
}

impl RunConfig {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            max_turns: 8,
            summary_interval: 4,
            history_window: None,
        }
    }

    /// Check the invariants the scheduler relies on
    ///
    /// An interval longer than the run is allowed; it just means only the
    /// final summary is produced.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topic.trim().is_empty() {
            return Err(ConfigError::EmptyTopic);
        }
        if self.max_turns == 0 {
            return Err(ConfigError::ZeroMaxTurns);
        }
        if self.summary_interval == 0 {
            return Err(ConfigError::ZeroSummaryInterval);
        }
        if self.history_window == Some(0) {
            return Err(ConfigError::ZeroHistoryWindow);
        }

        if !self.scheduler_context().has_periodic_summaries() {
            tracing::warn!(
                max_turns = self.max_turns,
                summary_interval = self.summary_interval,
                "No periodic summary fits before the last turn; only the final summary will be produced"
            );
        }
        Ok(())
    }

    pub fn scheduler_context(&self) -> SchedulerContext {
        SchedulerContext::new(self.max_turns, self.summary_interval)
    }

    /// Metadata for a new conversation, with display labels per role
    pub fn metadata(&self, participant_a: &str, participant_b: &str, summarizer: &str) -> RunMetadata {
        RunMetadata {
            topic: self.topic.trim().to_string(),
            max_turns: self.max_turns,
            summary_interval: self.summary_interval,
            participant_a: format!("Participant A ({participant_a})"),
            participant_b: format!("Participant B ({participant_b})"),
            summarizer: format!("Summarizer ({summarizer})"),
        }
    }
}
