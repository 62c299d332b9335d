use crate::errors::EngramResult;

/// The embedding capability. Remote by nature: every call is a suspension
/// point.
#[async_trait::async_trait]
pub trait IEmbeddingProvider: Send + Sync {
    /// Embed a single text into a fixed-width vector.
    async fn embed(&self, text: &str) -> EngramResult<Vec<f32>>;

    /// Embed a batch in one round-trip, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> EngramResult<Vec<Vec<f32>>>;

    /// The process-wide vector width this provider produces.
    fn dimensions(&self) -> usize;
}
