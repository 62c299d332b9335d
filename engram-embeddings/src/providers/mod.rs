//! Embedding providers: the remote OpenAI endpoint and a deterministic
//! local fallback.

mod hash_fallback;
mod openai;

pub use hash_fallback::HashFallback;
pub use openai::OpenAiEmbeddings;

use engram_core::config::EngramConfig;
use engram_core::traits::IEmbeddingProvider;
use tracing::warn;

/// Build the configured provider. Without an API key the deterministic
/// fallback takes over so the system keeps working offline (with reduced
/// semantic quality).
pub fn create_provider(config: &EngramConfig) -> Box<dyn IEmbeddingProvider> {
    match &config.openai_api_key {
        Some(key) => Box::new(OpenAiEmbeddings::new(
            key.clone(),
            config.embedding_model.clone(),
            config.embedding_dimensions,
        )),
        None => {
            warn!("OPENAI_API_KEY not set, using deterministic fallback embeddings");
            Box::new(HashFallback::new(config.embedding_dimensions))
        }
    }
}
