//! Chat providers. One request/response shape, two wire formats.

mod anthropic;
mod openai;

pub use anthropic::AnthropicChat;
pub use openai::OpenAiChat;

use engram_core::config::{EngramConfig, LlmProvider};
use engram_core::errors::{EngramError, EngramResult, LlmError};

/// A single-turn completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// The raw chat capability a provider implements.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> EngramResult<String>;
    fn name(&self) -> &'static str;
}

/// Build the configured provider, failing fast when the matching key is
/// absent.
pub fn create_provider(config: &EngramConfig) -> EngramResult<Box<dyn ChatProvider>> {
    match config.llm_provider {
        LlmProvider::Anthropic => {
            let key = config.anthropic_api_key.clone().ok_or_else(|| {
                EngramError::Llm(LlmError::MissingApiKey {
                    provider: "anthropic".to_string(),
                })
            })?;
            Ok(Box::new(AnthropicChat::new(
                key,
                config.anthropic_model.clone(),
            )))
        }
        LlmProvider::OpenAi => {
            let key = config.openai_api_key.clone().ok_or_else(|| {
                EngramError::Llm(LlmError::MissingApiKey {
                    provider: "openai".to_string(),
                })
            })?;
            Ok(Box::new(OpenAiChat::new(
                key,
                config.openai_llm_model.clone(),
            )))
        }
    }
}
