//! Centralized model definitions for all LLM providers

use super::anthropic::AnthropicModel;
use super::openai::OpenAIModel;
use super::{AnthropicService, LlmError, LlmService, OpenAIService};
use std::sync::Arc;

/// LLM provider enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAI,
    Perplexity,
    Anthropic,
}

impl Provider {
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Perplexity => "Perplexity",
            Provider::Anthropic => "Anthropic",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Perplexity => "PERPLEXITY_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

type Factory = fn(&str, Option<&str>) -> Result<Arc<dyn LlmService>, LlmError>;

/// Model definition with metadata
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// User-facing model ID (e.g., "gpt-4o")
    pub id: &'static str,
    pub provider: Provider,
    pub description: &'static str,
    /// Factory function to create the service
    pub factory: Factory,
}

fn openai(api_key: &str, gateway: Option<&str>, model: OpenAIModel) -> Result<Arc<dyn LlmService>, LlmError> {
    Ok(Arc::new(OpenAIService::new(api_key.to_string(), model, gateway)?))
}

fn anthropic(
    api_key: &str,
    gateway: Option<&str>,
    model: AnthropicModel,
) -> Result<Arc<dyn LlmService>, LlmError> {
    Ok(Arc::new(AnthropicService::new(api_key.to_string(), model, gateway)?))
}

/// Get all available model definitions
pub fn all_models() -> &'static [ModelDef] {
    &[
        ModelDef {
            id: "gpt-4o",
            provider: Provider::OpenAI,
            description: "GPT-4o (default for participant A)",
            factory: |key, gw| openai(key, gw, OpenAIModel::GPT4o),
        },
        ModelDef {
            id: "gpt-4o-mini",
            provider: Provider::OpenAI,
            description: "GPT-4o mini (fast, default summarizer)",
            factory: |key, gw| openai(key, gw, OpenAIModel::GPT4oMini),
        },
        ModelDef {
            id: "sonar",
            provider: Provider::Perplexity,
            description: "Perplexity Sonar (default for participant B)",
            factory: |key, gw| openai(key, gw, OpenAIModel::Sonar),
        },
        ModelDef {
            id: "sonar-pro",
            provider: Provider::Perplexity,
            description: "Perplexity Sonar Pro",
            factory: |key, gw| openai(key, gw, OpenAIModel::SonarPro),
        },
        ModelDef {
            id: "claude-sonnet-4",
            provider: Provider::Anthropic,
            description: "Claude Sonnet 4",
            factory: |key, gw| anthropic(key, gw, AnthropicModel::ClaudeSonnet4),
        },
        ModelDef {
            id: "claude-haiku-3.5",
            provider: Provider::Anthropic,
            description: "Claude 3.5 Haiku (fast)",
            factory: |key, gw| anthropic(key, gw, AnthropicModel::Claude35Haiku),
        },
    ]
}

/// Look up a model definition by ID
pub fn find_model(id: &str) -> Option<&'static ModelDef> {
    all_models().iter().find(|m| m.id == id)
}
