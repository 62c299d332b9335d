use serde::{Deserialize, Serialize};

use crate::errors::EngramResult;
use crate::memory::MemoryType;
use crate::models::{Claim, ConflictResolution, EntityRelationship};

/// What the classification fallback returns for an unclassified write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    pub memory_type: Option<MemoryType>,
    pub domain: Option<String>,
    pub category: Option<String>,
}

/// A candidate memory surfaced while shadow-listening to a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftExtraction {
    pub content: String,
    /// "user" or "assistant"; drives the draft's base confidence.
    pub role: String,
    pub reason: Option<String>,
}

/// The generative language-model capability, expressed as the typed tasks
/// the engines need. Raw prompt/response strings stay inside the adapter.
#[async_trait::async_trait]
pub trait ILanguageModel: Send + Sync {
    /// Extract structured claims from a conversation transcript.
    async fn extract_claims(&self, transcript: &str) -> EngramResult<Vec<Claim>>;

    /// Judge whether two similar statements truly contradict, and whether
    /// thinking evolved from one to the other.
    async fn resolve_conflict(
        &self,
        statement_a: &str,
        statement_b: &str,
        similarity: f64,
    ) -> EngramResult<ConflictResolution>;

    /// Cheap yes/no contradiction check used on the write path.
    async fn check_contradiction(
        &self,
        statement_a: &str,
        statement_b: &str,
    ) -> EngramResult<bool>;

    /// Flat entity-name extraction.
    async fn extract_entities(&self, text: &str) -> EngramResult<Vec<String>>;

    /// Infer typed relationships between entities from finalised claims.
    async fn infer_relationships(
        &self,
        claims: &[Claim],
        entities: &[String],
    ) -> EngramResult<Vec<EntityRelationship>>;

    /// Short textual behaviour patterns across a claim set.
    async fn detect_patterns(&self, claims: &[Claim]) -> EngramResult<Vec<String>>;

    /// Classify content into type/domain/category, given what the user
    /// already has.
    async fn classify_content(
        &self,
        content: &str,
        known_domains: &[String],
        known_categories: &[String],
    ) -> EngramResult<Classification>;

    /// Patterns and insights over an evolution timeline rendering.
    async fn timeline_insights(
        &self,
        entity_name: &str,
        timeline: &str,
    ) -> EngramResult<(Vec<String>, Vec<String>)>;

    /// Extract candidate draft memories from a live conversation buffer.
    async fn extract_conversation_memories(
        &self,
        context: &str,
    ) -> EngramResult<Vec<DraftExtraction>>;
}
