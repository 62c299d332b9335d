//! Tool: recall — graph-enhanced memory retrieval.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use engram_core::memory::MemoryType;
use engram_core::models::{DateRange, RecallFilters, RecallOptions};
use engram_core::{EngramError, EngramResult};

use crate::context::EngramContext;

#[derive(Debug, Clone, Deserialize)]
pub struct RecallInput {
    pub query: String,
    #[serde(default)]
    pub memory_type: Option<String>,
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub date_range: Option<String>,
    #[serde(default)]
    pub importance_min: Option<u8>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub category_prefix: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_true")]
    pub respect_evolution: bool,
    #[serde(default = "default_true")]
    pub expand_entities: bool,
    #[serde(default)]
    pub include_related: bool,
    #[serde(default = "default_true")]
    pub apply_recency_boost: bool,
}

fn default_limit() -> usize {
    10
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct RecalledMemory {
    pub memory_id: Uuid,
    pub content: String,
    pub memory_type: String,
    pub similarity: f64,
    pub importance: u8,
    pub entities: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecallOutput {
    pub query: String,
    pub count: usize,
    pub total_available: u64,
    pub memories: Vec<RecalledMemory>,
    pub search_time_ms: u64,
    pub evolution_filtered: usize,
    pub entity_expanded: usize,
    pub partial: bool,
}

pub async fn recall(
    context: &EngramContext,
    user_id: Uuid,
    input: RecallInput,
) -> EngramResult<RecallOutput> {
    let filters = RecallFilters {
        memory_type: input
            .memory_type
            .as_deref()
            .map(|t| MemoryType::from_str(&t.to_lowercase()).map_err(EngramError::validation))
            .transpose()?,
        min_importance: input.importance_min,
        entity: input.entity,
        date_range: input
            .date_range
            .as_deref()
            .map(|r| DateRange::from_str(r).map_err(EngramError::validation))
            .transpose()?,
        domain: input.domain,
        category_prefix: input.category_prefix,
        status: None,
    };
    let options = RecallOptions {
        respect_evolution: input.respect_evolution,
        expand_entities: input.expand_entities,
        include_related: input.include_related,
        apply_recency_boost: input.apply_recency_boost,
    };

    let result = context
        .recall
        .recall(user_id, &input.query, &filters, input.limit, input.offset, options)
        .await?;

    context.audit.record(
        user_id,
        "recall",
        "ok",
        Some(format!("{} results", result.count)),
    );

    Ok(RecallOutput {
        query: result.query,
        count: result.count,
        total_available: result.total_available,
        memories: result
            .memories
            .into_iter()
            .map(|scored| RecalledMemory {
                memory_id: scored.memory.id,
                content: scored.memory.content.clone(),
                memory_type: scored.memory.memory_type.as_str().to_string(),
                similarity: scored.similarity,
                importance: scored.memory.importance,
                entities: scored.memory.entities.clone(),
                created_at: scored.memory.created_at,
            })
            .collect(),
        search_time_ms: result.search_time_ms,
        evolution_filtered: result.evolution_filtered,
        entity_expanded: result.entity_expanded,
        partial: result.partial,
    })
}

pub fn spec() -> serde_json::Value {
    json!({
        "name": "recall",
        "description": "Search memories by meaning. Evolution-aware: superseded knowledge is hidden unless asked for.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Natural language search query"
                },
                "memory_type": {
                    "type": "string",
                    "enum": ["episodic", "semantic", "preference", "procedural", "meta"]
                },
                "entity": {
                    "type": "string",
                    "description": "Filter to memories mentioning this entity"
                },
                "date_range": {
                    "type": "string",
                    "enum": ["last_7_days", "last_30_days", "last_year", "all_time"]
                },
                "importance_min": {"type": "integer", "minimum": 1, "maximum": 10},
                "limit": {"type": "integer", "minimum": 1, "maximum": 50, "default": 10},
                "offset": {"type": "integer", "minimum": 0, "default": 0},
                "respect_evolution": {"type": "boolean", "default": true},
                "expand_entities": {"type": "boolean", "default": true},
                "include_related": {"type": "boolean", "default": false},
                "apply_recency_boost": {"type": "boolean", "default": true}
            },
            "required": ["query"]
        }
    })
}
