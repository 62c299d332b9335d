//! Tool: remember — store a new memory.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use engram_core::memory::{MemorySource, MemoryType, NewMemory};
use engram_core::{EngramError, EngramResult};

use crate::context::EngramContext;

#[derive(Debug, Clone, Deserialize)]
pub struct RememberInput {
    pub content: String,
    pub memory_type: String,
    #[serde(default)]
    pub entities: Option<Vec<String>>,
    #[serde(default)]
    pub importance: Option<u8>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RememberOutput {
    pub memory_id: Uuid,
    pub status: String,
    pub embedding_status: String,
    pub entities_extracted: Vec<String>,
    pub created_at: DateTime<Utc>,
}

pub async fn remember(
    context: &EngramContext,
    user_id: Uuid,
    input: RememberInput,
) -> EngramResult<RememberOutput> {
    let memory_type = MemoryType::from_str(&input.memory_type.to_lowercase())
        .map_err(EngramError::validation)?;
    let importance = input.importance.map(|i| i.clamp(1, 10));

    // Extract entities up front when the caller did not provide any, so
    // the response can report what was learned.
    let entities = match input.entities {
        Some(entities) if !entities.is_empty() => entities,
        _ => {
            context
                .entities
                .extract_and_learn(user_id, &input.content)
                .await?
                .names()
        }
    };

    let new = NewMemory {
        content: input.content,
        memory_type: Some(memory_type),
        status: None,
        entities: entities.clone(),
        domain: None,
        category: None,
        importance,
        confidence: None,
        source: Some(MemorySource::Manual),
        source_id: None,
        metadata: input.metadata.unwrap_or_default(),
        embedding: None,
    };

    let (memory, outcome) = context.processor.process_memory(user_id, new).await?;
    context
        .audit
        .record(user_id, "remember", outcome.as_str(), None);

    info!(
        memory_id = %memory.id,
        entities_count = entities.len(),
        outcome = %outcome,
        "memory stored"
    );

    Ok(RememberOutput {
        memory_id: memory.id,
        status: outcome.as_str().to_string(),
        embedding_status: "generated".to_string(),
        entities_extracted: entities,
        created_at: memory.created_at,
    })
}

pub fn spec() -> serde_json::Value {
    json!({
        "name": "remember",
        "description": "Store a new memory. Use this to remember facts, preferences, learnings, or procedures about the user.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The memory content (what to remember)",
                    "minLength": 1,
                    "maxLength": 8000
                },
                "memory_type": {
                    "type": "string",
                    "enum": ["episodic", "semantic", "preference", "procedural", "meta"],
                    "description": "Type of memory: episodic (specific events), semantic (facts), preference (user preferences), procedural (how-to), meta (about user's knowledge)"
                },
                "entities": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Related entities/concepts (auto-extracted if not provided)"
                },
                "importance": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 10,
                    "default": 5,
                    "description": "Importance level (1=least, 10=most)"
                },
                "metadata": {
                    "type": "object",
                    "description": "Additional custom metadata"
                }
            },
            "required": ["content", "memory_type"]
        }
    })
}
