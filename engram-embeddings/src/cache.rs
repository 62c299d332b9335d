//! L1 in-process embedding cache keyed by blake3 content hash.

use std::time::Duration;

use moka::sync::Cache;

/// Write-through cache in front of the remote provider. Identical text
/// never embeds twice within the TTL window.
pub struct EmbeddingCache {
    inner: Cache<String, Vec<f32>>,
}

impl EmbeddingCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn key_for(text: &str) -> String {
        blake3::hash(text.as_bytes()).to_hex().to_string()
    }

    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.inner.get(&Self::key_for(text))
    }

    pub fn put(&self, text: &str, embedding: &[f32]) {
        self.inner.insert(Self::key_for(text), embedding.to_vec());
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(5_000, Duration::from_secs(3_600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_after_put() {
        let cache = EmbeddingCache::default();
        assert!(cache.get("hello").is_none());
        cache.put("hello", &[0.1, 0.2]);
        assert_eq!(cache.get("hello"), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn keys_are_content_hashes() {
        assert_eq!(EmbeddingCache::key_for("a"), EmbeddingCache::key_for("a"));
        assert_ne!(EmbeddingCache::key_for("a"), EmbeddingCache::key_for("b"));
    }
}
