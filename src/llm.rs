//! Chat completion providers
//!
//! OpenAI (and the OpenAI-compatible Perplexity host) plus Anthropic, behind
//! one text-in, text-out trait.

mod anthropic;
mod error;
mod models;
mod openai;
mod registry;
mod types;

pub use anthropic::{AnthropicModel, AnthropicService};
pub use error::{LlmError, LlmErrorKind};
pub use models::{all_models, find_model, ModelDef, Provider};
pub use openai::{OpenAIModel, OpenAIService};
pub use registry::{LlmConfig, ModelRegistry};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// A chat model that turns one request into one text reply
///
/// Implementations never retry. Failures are classified by [`LlmErrorKind`]
/// and left to the caller.
#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Catalog id the service was built for (e.g. "gpt-4o")
    fn model_id(&self) -> &str;
}

/// Wraps a provider and records every call at `info`/`error`
///
/// The registry hands out services already wrapped, so participants and
/// the summarizer get per-call latency and token counts for free.
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let started = Instant::now();
        let result = self.inner.complete(request).await;
        let elapsed_ms = started.elapsed().as_millis();

        match &result {
            Ok(reply) if reply.truncated => tracing::warn!(
                model = %self.model_id,
                %elapsed_ms,
                messages = request.messages.len(),
                output_tokens = reply.usage.output_tokens,
                max_tokens = ?request.max_tokens,
                "Reply hit the token cap"
            ),
            Ok(reply) => tracing::info!(
                model = %self.model_id,
                %elapsed_ms,
                messages = request.messages.len(),
                input_tokens = reply.usage.input_tokens,
                output_tokens = reply.usage.output_tokens,
                "Completion received"
            ),
            Err(e) => tracing::error!(
                model = %self.model_id,
                %elapsed_ms,
                kind = ?e.kind,
                retryable = e.kind.is_retryable(),
                error = %e.message,
                "Completion failed"
            ),
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
