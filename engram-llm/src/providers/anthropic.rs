//! Anthropic messages API adapter.

use serde_json::json;
use tracing::debug;

use engram_core::errors::{EngramError, EngramResult, LlmError};

use super::{ChatProvider, CompletionRequest};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicChat {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait::async_trait]
impl ChatProvider for AnthropicChat {
    async fn complete(&self, request: &CompletionRequest) -> EngramResult<String> {
        let payload = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "system": request.system.as_deref().unwrap_or("You are a helpful AI assistant."),
            "messages": [{"role": "user", "content": request.prompt}],
            "temperature": request.temperature,
        });

        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                EngramError::Llm(LlmError::Unavailable {
                    reason: e.to_string(),
                })
            })?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.map_err(|e| {
            EngramError::Llm(LlmError::Unavailable {
                reason: format!("invalid response body: {e}"),
            })
        })?;

        if !status.is_success() {
            return Err(EngramError::Llm(LlmError::RequestFailed {
                status: status.as_u16(),
                body: body.to_string(),
            }));
        }

        let text = body
            .get("content")
            .and_then(|c| c.as_array())
            .and_then(|blocks| {
                blocks
                    .iter()
                    .find_map(|b| b.get("text").and_then(|t| t.as_str()))
            })
            .unwrap_or("")
            .to_string();

        debug!(
            input_tokens = body["usage"]["input_tokens"].as_u64().unwrap_or(0),
            output_tokens = body["usage"]["output_tokens"].as_u64().unwrap_or(0),
            "anthropic completion"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}
