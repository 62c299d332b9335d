use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate view over a user's non-deleted memories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_memories: u64,
    pub preference_count: u64,
    pub semantic_count: u64,
    pub episodic_count: u64,
    pub procedural_count: u64,
    pub meta_count: u64,
    pub avg_importance: f64,
    pub first_memory_date: Option<DateTime<Utc>>,
    pub last_memory_date: Option<DateTime<Utc>>,
    pub total_accesses: u64,
}
