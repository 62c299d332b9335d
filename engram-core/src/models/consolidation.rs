use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Terminal and transient states of a consolidation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ConsolidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for ConsolidationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("invalid consolidation status: {other}")),
        }
    }
}

impl fmt::Display for ConsolidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one consolidation run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationResult {
    pub consolidation_id: Uuid,
    pub user_id: Uuid,
    pub transcript_length: usize,
    pub claims_extracted: usize,
    pub new_memories_count: usize,
    pub new_memory_ids: Vec<Uuid>,
    /// Duplicate claims merged into canonicals.
    pub merged_count: usize,
    pub conflicts_resolved: usize,
    pub edges_created: usize,
    pub patterns_detected: Vec<String>,
    pub key_entities: Vec<String>,
    pub processing_time_ms: u64,
    pub status: ConsolidationStatus,
    pub error_message: Option<String>,
}

impl ConsolidationResult {
    /// A completed result for a transcript that yielded no claims.
    pub fn empty(user_id: Uuid, consolidation_id: Uuid, transcript_length: usize) -> Self {
        Self {
            consolidation_id,
            user_id,
            transcript_length,
            claims_extracted: 0,
            new_memories_count: 0,
            new_memory_ids: Vec::new(),
            merged_count: 0,
            conflicts_resolved: 0,
            edges_created: 0,
            patterns_detected: Vec::new(),
            key_entities: Vec::new(),
            processing_time_ms: 0,
            status: ConsolidationStatus::Completed,
            error_message: None,
        }
    }
}

/// Audit row persisted for every consolidation run, including failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub conversation_id: Option<String>,
    pub consolidation_date: DateTime<Utc>,
    pub transcript_length: usize,
    pub claims_extracted: usize,
    pub new_memories_created: usize,
    pub merged_count: usize,
    pub conflicts_resolved: usize,
    pub edges_created: usize,
    pub processing_time_ms: u64,
    pub patterns_detected: Vec<String>,
    pub key_entities: Vec<String>,
    pub status: ConsolidationStatus,
    pub error_message: Option<String>,
}

impl ConsolidationHistory {
    pub fn from_result(result: &ConsolidationResult, conversation_id: Option<String>) -> Self {
        Self {
            id: result.consolidation_id,
            user_id: result.user_id,
            conversation_id,
            consolidation_date: Utc::now(),
            transcript_length: result.transcript_length,
            claims_extracted: result.claims_extracted,
            new_memories_created: result.new_memories_count,
            merged_count: result.merged_count,
            conflicts_resolved: result.conflicts_resolved,
            edges_created: result.edges_created,
            processing_time_ms: result.processing_time_ms,
            patterns_detected: result.patterns_detected.clone(),
            key_entities: result.key_entities.clone(),
            status: result.status,
            error_message: result.error_message.clone(),
        }
    }
}
