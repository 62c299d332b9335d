//! OpenAI chat-completions adapter.

use serde_json::json;
use tracing::debug;

use engram_core::errors::{EngramError, EngramResult, LlmError};

use super::{ChatProvider, CompletionRequest};

const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenAiChat {
    async fn complete(&self, request: &CompletionRequest) -> EngramResult<String> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));

        let payload = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let response = self
            .client
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
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
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .unwrap_or("")
            .to_string();

        debug!(
            input_tokens = body["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            output_tokens = body["usage"]["completion_tokens"].as_u64().unwrap_or(0),
            "openai completion"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
