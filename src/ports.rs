//! Generation capabilities the driver depends on
//!
//! Both ports are opaque remote calls. Implementations map every provider
//! failure to [`GenerationFailure`] and never retry.

mod participant;
pub mod prompt;
mod summarizer;

#[cfg(test)]
mod proptests;

pub use participant::LlmParticipant;
pub use summarizer::LlmSummarizer;

use crate::conversation::{GenerationFailure, Role, SummaryFields, SummaryScope, Turn, TurnRange};
use async_trait::async_trait;
use std::sync::Arc;

/// Everything a participant sees when asked to speak
#[derive(Debug, Clone)]
pub struct ParticipantContext<'a> {
    pub topic: &'a str,
    pub role: Role,
    /// Number this turn will take once recorded
    pub turn: u32,
    pub max_turns: u32,
    /// Role-specific system instructions
    pub instructions: String,
    /// Recent history, oldest first
    pub history: &'a [Turn],
}

/// One generated utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub role: Role,
    pub content: String,
}

/// Input for a summary
#[derive(Debug, Clone)]
pub struct SummaryRequest<'a> {
    pub topic: &'a str,
    pub range: TurnRange,
    pub scope: SummaryScope,
    /// Turns inside `range`, oldest first
    pub turns: Vec<&'a Turn>,
}

/// A conversational participant
#[async_trait]
pub trait ParticipantPort: Send + Sync {
    /// Role this participant speaks as
    fn role(&self) -> Role;

    /// Display label used in transcripts
    fn label(&self) -> &str;

    /// Produce the next utterance
    async fn respond(&self, context: &ParticipantContext<'_>) -> Result<Utterance, GenerationFailure>;
}

/// Produces structured summaries of a turn range
#[async_trait]
pub trait SummarizerPort: Send + Sync {
    fn label(&self) -> &str;

    async fn summarize(&self, request: &SummaryRequest<'_>) -> Result<SummaryFields, GenerationFailure>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ParticipantPort + ?Sized> ParticipantPort for Arc<T> {
    fn role(&self) -> Role {
        (**self).role()
    }

    fn label(&self) -> &str {
        (**self).label()
    }

    async fn respond(&self, context: &ParticipantContext<'_>) -> Result<Utterance, GenerationFailure> {
        (**self).respond(context).await
    }
}

#[async_trait]
impl<T: SummarizerPort + ?Sized> SummarizerPort for Arc<T> {
    fn label(&self) -> &str {
        (**self).label()
    }

    async fn summarize(&self, request: &SummaryRequest<'_>) -> Result<SummaryFields, GenerationFailure> {
        (**self).summarize(request).await
    }
}
