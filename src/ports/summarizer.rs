//! Summarizer backed by an LLM service

use super::prompt::{parse_summary, summarizer_system_prompt, summarizer_user_prompt};
use super::{SummarizerPort, SummaryRequest};
use crate::conversation::{GenerationFailure, Role, SummaryFields, SummaryScope};
use crate::llm::{LlmMessage, LlmRequest, LlmService};
use async_trait::async_trait;
use std::sync::Arc;

const SUMMARY_TEMPERATURE: f32 = 0.3;
const DEFAULT_MAX_TOKENS: u32 = 800;

pub struct LlmSummarizer {
    service: Arc<dyn LlmService>,
    label: String,
}

impl LlmSummarizer {
    pub fn new(service: Arc<dyn LlmService>) -> Self {
        let label = service.model_id().to_string();
        Self { service, label }
    }
}

#[async_trait]
impl SummarizerPort for LlmSummarizer {
    fn label(&self) -> &str {
        &self.label
    }

    async fn summarize(&self, request: &SummaryRequest<'_>) -> Result<SummaryFields, GenerationFailure> {
        let llm_request = LlmRequest {
            system: Some(summarizer_system_prompt(request.scope, request.topic)),
            messages: vec![LlmMessage::user(summarizer_user_prompt(request.scope, &request.turns))],
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            temperature: Some(SUMMARY_TEMPERATURE),
        };

        let response = self
            .service
            .complete(&llm_request)
            .await
            .map_err(|e| GenerationFailure::new(Role::Summarizer, e))?;

        tracing::debug!(
            range = %request.range,
            scope = %request.scope,
            chars = response.text.len(),
            "Summary generated"
        );

        let mut fields = parse_summary(&response.text);
        if request.scope == SummaryScope::Periodic {
            fields.executive_summary = None;
        }
        Ok(fields)
    }
}
