use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::memory::MemoryType;

/// How a mention relates to the previous one on an entity's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// First mention of the entity.
    Introduced,
    /// An evolution edge connects the previous mention to this one.
    Evolved,
    /// Importance rose relative to the previous mention.
    Strengthened,
    /// Importance fell relative to the previous mention.
    Weakened,
    /// A plain repeat mention.
    Mentioned,
}

/// One point on an entity's evolution timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionEvent {
    pub date: DateTime<Utc>,
    pub memory_id: Uuid,
    pub content_summary: String,
    pub memory_type: MemoryType,
    pub importance: u8,
    pub change: ChangeKind,
}

/// The full analysis the `analyze_evolution` tool returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionReport {
    pub entity_name: String,
    pub evolution_timeline: Vec<EvolutionEvent>,
    pub patterns: Vec<String>,
    pub insights: Vec<String>,
    pub related_entities: Vec<String>,
    pub total_mentions: usize,
    pub first_mentioned: Option<DateTime<Utc>>,
    pub last_mentioned: Option<DateTime<Utc>>,
}
