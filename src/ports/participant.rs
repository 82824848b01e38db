//! Participant backed by an LLM service

use super::prompt::{clean_response, filler, history_messages};
use super::{ParticipantContext, ParticipantPort, Utterance};
use crate::conversation::{GenerationFailure, Role};
use crate::llm::{LlmRequest, LlmService};
use async_trait::async_trait;
use std::sync::Arc;

/// Replies are capped well above the 100-word instruction
const DEFAULT_MAX_TOKENS: u32 = 300;

pub struct LlmParticipant {
    service: Arc<dyn LlmService>,
    role: Role,
    label: String,
    max_tokens: u32,
}

impl LlmParticipant {
    /// Labels default to the service's model id
    pub fn new(role: Role, service: Arc<dyn LlmService>) -> Self {
        let label = service.model_id().to_string();
        Self {
            service,
            role,
            label,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[async_trait]
impl ParticipantPort for LlmParticipant {
    fn role(&self) -> Role {
        self.role
    }

    fn label(&self) -> &str {
        &self.label
    }

    async fn respond(&self, context: &ParticipantContext<'_>) -> Result<Utterance, GenerationFailure> {
        let request = LlmRequest {
            system: Some(context.instructions.clone()),
            messages: history_messages(self.role, context.topic, context.history),
            max_tokens: Some(self.max_tokens),
            temperature: None,
        };

        let response = self
            .service
            .complete(&request)
            .await
            .map_err(|e| GenerationFailure::new(self.role, e))?;

        let mut content = clean_response(&response.text);
        if content.is_empty() {
            tracing::warn!(role = %self.role, model = %self.label, "Empty reply, using filler");
            content = filler(self.role).to_string();
        }

        Ok(Utterance {
            role: self.role,
            content,
        })
    }
}
