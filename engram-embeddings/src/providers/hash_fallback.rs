//! Deterministic local fallback: token feature hashing into the target
//! width. Identical text maps to identical vectors, which is what dedup
//! and the test suite rely on; semantic neighbourhoods are approximate.

use engram_core::errors::EngramResult;
use engram_core::traits::IEmbeddingProvider;

pub struct HashFallback {
    dimensions: usize,
}

impl HashFallback {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let index = u64::from_le_bytes(bytes[0..8].try_into().unwrap()) as usize
                % self.dimensions;
            // Signed weighting spreads tokens over both half-spaces.
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait::async_trait]
impl IEmbeddingProvider for HashFallback {
    async fn embed(&self, text: &str) -> EngramResult<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> EngramResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
