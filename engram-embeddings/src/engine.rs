//! EmbeddingEngine — cache, retry, and provider behind one interface.

use std::time::Duration;

use tracing::{debug, warn};

use engram_core::config::EngramConfig;
use engram_core::errors::EngramResult;
use engram_core::retry::RetryPolicy;
use engram_core::traits::IEmbeddingProvider;

use crate::cache::EmbeddingCache;
use crate::providers;

/// The main embedding engine. Checks the blake3-keyed cache, then calls
/// the provider with exponential backoff, then writes through.
/// Implements `IEmbeddingProvider` so it drops in anywhere a provider is
/// expected.
pub struct EmbeddingEngine {
    provider: Box<dyn IEmbeddingProvider>,
    cache: EmbeddingCache,
    retry: RetryPolicy,
}

impl EmbeddingEngine {
    pub fn new(config: &EngramConfig) -> Self {
        Self::with_provider(providers::create_provider(config), config)
    }

    /// Wrap an explicit provider (tests inject scripted ones here).
    pub fn with_provider(provider: Box<dyn IEmbeddingProvider>, config: &EngramConfig) -> Self {
        Self {
            provider,
            cache: EmbeddingCache::new(
                5_000,
                Duration::from_secs(config.cache_ttl_memories_secs),
            ),
            retry: RetryPolicy::default(),
        }
    }

    async fn embed_uncached(&self, text: &str) -> EngramResult<Vec<f32>> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.provider.embed(text).await {
                Ok(vector) => return Ok(vector),
                Err(e) if e.is_transient() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e,
                        "embedding request failed, backing off");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn embed_batch_uncached(&self, texts: &[String]) -> EngramResult<Vec<Vec<f32>>> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.provider.embed_batch(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(e) if e.is_transient() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e,
                        "batch embedding request failed, backing off");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait::async_trait]
impl IEmbeddingProvider for EmbeddingEngine {
    async fn embed(&self, text: &str) -> EngramResult<Vec<f32>> {
        if let Some(cached) = self.cache.get(text) {
            debug!("embedding cache hit");
            return Ok(cached);
        }
        let vector = self.embed_uncached(text).await?;
        self.cache.put(text, &vector);
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> EngramResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        // Serve what we can from cache; one round-trip for the rest.
        let mut results: Vec<Option<Vec<f32>>> = texts.iter().map(|t| self.cache.get(t)).collect();
        let missing: Vec<(usize, String)> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_none())
            .map(|(i, _)| (i, texts[i].clone()))
            .collect();

        if !missing.is_empty() {
            let missing_texts: Vec<String> = missing.iter().map(|(_, t)| t.clone()).collect();
            let fresh = self.embed_batch_uncached(&missing_texts).await?;
            for ((index, text), vector) in missing.into_iter().zip(fresh) {
                self.cache.put(&text, &vector);
                results[index] = Some(vector);
            }
        }

        Ok(results.into_iter().flatten().collect())
    }

    fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }
}
