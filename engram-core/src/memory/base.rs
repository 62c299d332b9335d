use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{MemorySource, MemoryStatus, MemoryType};

/// The central entity: a user-owned piece of knowledge with an embedding,
/// taxonomy, lifecycle status, and provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// UUID v4 identifier.
    pub id: Uuid,
    /// Hard isolation key. Every query is predicated on this.
    pub user_id: Uuid,
    /// Text payload, at most 8 000 characters.
    pub content: String,
    pub memory_type: MemoryType,
    pub status: MemoryStatus,
    /// Fixed-width embedding vector. Excluded from JSON responses.
    #[serde(skip_serializing, default)]
    pub embedding: Option<Vec<f32>>,
    /// Ordered entity names mentioned in the content.
    pub entities: Vec<String>,
    /// High-level domain (e.g. "KnowWhere", "Personal").
    pub domain: Option<String>,
    /// Hierarchical, slash-separated category path (e.g. "Backend/Auth").
    pub category: Option<String>,
    /// Salience in 1..=10.
    pub importance: u8,
    /// Confidence in 0.0..=1.0.
    pub confidence: f64,
    pub source: MemorySource,
    /// Free-form reference (conversation id, file id, ...).
    pub source_id: Option<String>,
    pub metadata: BTreeMap<String, String>,
    /// Set iff status is `Superseded`; points to the active replacement.
    pub superseded_by: Option<Uuid>,
    /// Number of times recall returned this memory.
    pub access_count: u64,
    pub last_accessed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set iff status is `Deleted`.
    pub deleted_at: Option<DateTime<Utc>>,
    /// blake3 hash of the content, used for dedup and embedding caching.
    pub content_hash: String,
}

impl Memory {
    /// blake3 hex digest of a content string.
    pub fn hash_content(content: &str) -> String {
        blake3::hash(content.as_bytes()).to_hex().to_string()
    }

    pub fn is_active(&self) -> bool {
        self.status == MemoryStatus::Active
    }

    pub fn is_preference(&self) -> bool {
        self.memory_type == MemoryType::Preference
    }

    /// First 500 characters of content, for display.
    pub fn content_preview(&self) -> &str {
        let end = self
            .content
            .char_indices()
            .nth(500)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len());
        &self.content[..end]
    }
}

impl PartialEq for Memory {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Payload for creating a memory. The processor fills whatever is absent:
/// type via heuristics, importance via the derivation rules, embedding via
/// the provider.
#[derive(Debug, Clone, Default)]
pub struct NewMemory {
    pub content: String,
    pub memory_type: Option<MemoryType>,
    pub status: Option<MemoryStatus>,
    pub entities: Vec<String>,
    pub domain: Option<String>,
    pub category: Option<String>,
    pub importance: Option<u8>,
    pub confidence: Option<f64>,
    pub source: Option<MemorySource>,
    pub source_id: Option<String>,
    pub metadata: BTreeMap<String, String>,
    /// Reused when already computed (consolidation batches).
    pub embedding: Option<Vec<f32>>,
}

impl NewMemory {
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}
