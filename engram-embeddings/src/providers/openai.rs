//! Remote embedding provider speaking the OpenAI embeddings API.

use serde_json::json;

use engram_core::errors::{EmbeddingError, EngramError, EngramResult};
use engram_core::traits::IEmbeddingProvider;

const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// HTTP client for the `/v1/embeddings` endpoint, requesting the
/// process-wide dimension count on every call.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddings {
    pub fn new(api_key: String, model: String, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            dimensions,
        }
    }

    async fn request(&self, input: serde_json::Value) -> EngramResult<Vec<Vec<f32>>> {
        let payload = json!({
            "model": self.model,
            "input": input,
            "dimensions": self.dimensions,
        });

        let response = self
            .client
            .post(EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                EngramError::Embedding(EmbeddingError::Unavailable {
                    reason: e.to_string(),
                })
            })?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.map_err(|e| {
            EngramError::Embedding(EmbeddingError::Unavailable {
                reason: format!("invalid response body: {e}"),
            })
        })?;

        if !status.is_success() {
            return Err(EngramError::Embedding(EmbeddingError::RequestFailed {
                status: status.as_u16(),
                body: body.to_string(),
            }));
        }

        let data = body
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| {
                EngramError::Embedding(EmbeddingError::Unavailable {
                    reason: "response missing data array".to_string(),
                })
            })?;

        let mut embeddings = Vec::with_capacity(data.len());
        for item in data {
            let vector: Vec<f32> = item
                .get("embedding")
                .and_then(|e| e.as_array())
                .map(|values| {
                    values
                        .iter()
                        .filter_map(|v| v.as_f64())
                        .map(|v| v as f32)
                        .collect()
                })
                .ok_or_else(|| {
                    EngramError::Embedding(EmbeddingError::Unavailable {
                        reason: "response item missing embedding".to_string(),
                    })
                })?;

            if vector.len() != self.dimensions {
                return Err(EngramError::Embedding(EmbeddingError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: vector.len(),
                }));
            }
            embeddings.push(vector);
        }
        Ok(embeddings)
    }
}

#[async_trait::async_trait]
impl IEmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> EngramResult<Vec<f32>> {
        let mut embeddings = self.request(serde_json::Value::String(text.to_string())).await?;
        embeddings.pop().ok_or_else(|| {
            EngramError::Embedding(EmbeddingError::Unavailable {
                reason: "empty embedding response".to_string(),
            })
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> EngramResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let input = serde_json::Value::Array(
            texts
                .iter()
                .map(|t| serde_json::Value::String(t.clone()))
                .collect(),
        );
        let embeddings = self.request(input).await?;
        if embeddings.len() != texts.len() {
            return Err(EngramError::Embedding(EmbeddingError::Unavailable {
                reason: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    embeddings.len()
                ),
            }));
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
