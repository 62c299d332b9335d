//! Shared helpers for storage integration tests.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use engram_core::memory::{Memory, MemorySource, MemoryStatus, MemoryType};

/// A minimal active memory with the given content and a unit-norm 4-dim
/// embedding.
pub fn memory(user_id: Uuid, content: &str, embedding: Vec<f32>) -> Memory {
    Memory {
        id: Uuid::new_v4(),
        user_id,
        content: content.to_string(),
        memory_type: MemoryType::Semantic,
        status: MemoryStatus::Active,
        embedding: Some(embedding),
        entities: vec![],
        domain: None,
        category: None,
        importance: 5,
        confidence: 0.8,
        source: MemorySource::Manual,
        source_id: None,
        metadata: BTreeMap::new(),
        superseded_by: None,
        access_count: 0,
        last_accessed: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
        content_hash: Memory::hash_content(content),
    }
}
