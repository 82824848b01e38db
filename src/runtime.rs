//! Runtime for driving a conversation to completion

mod driver;

#[cfg(test)]
pub mod testing;

pub use driver::{Fallback, RunDriver, StepOutcome};

use crate::ports::{LlmParticipant, LlmSummarizer};

/// Driver wired to real LLM-backed ports
pub type ProductionDriver = RunDriver<LlmParticipant, LlmParticipant, LlmSummarizer>;
