//! Tool: update_memory — field-wise status and metadata hygiene.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use engram_core::memory::{Memory, MemoryStatus, MemoryType};
use engram_core::traits::{IEmbeddingProvider, IMemoryStorage};
use engram_core::{validate, EngramError, EngramResult};

use crate::context::EngramContext;

/// Statuses this tool may set directly. Supersession and deletion go
/// through their own tools.
const SETTABLE_STATUSES: [MemoryStatus; 4] = [
    MemoryStatus::Active,
    MemoryStatus::Stale,
    MemoryStatus::Irrelevant,
    MemoryStatus::Archived,
];

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInput {
    pub memory_id: Uuid,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub importance: Option<u8>,
    #[serde(default)]
    pub memory_type: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub entities: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutput {
    pub memory_id: Uuid,
    pub new_status: String,
}

pub async fn update_memory(
    context: &EngramContext,
    user_id: Uuid,
    input: UpdateInput,
) -> EngramResult<UpdateOutput> {
    let mut memory = context
        .storage
        .get(user_id, input.memory_id)?
        .filter(|m| m.status != MemoryStatus::Deleted)
        .ok_or_else(|| EngramError::not_found("memory", input.memory_id))?;

    if let Some(status_str) = &input.status {
        let status = MemoryStatus::from_str(status_str).map_err(EngramError::validation)?;
        if !SETTABLE_STATUSES.contains(&status) {
            return Err(EngramError::validation(format!(
                "status '{status}' cannot be set directly"
            )));
        }
        memory.status = status;
    }
    if let Some(importance) = input.importance {
        validate::importance(importance)?;
        memory.importance = importance;
    }
    if let Some(type_str) = &input.memory_type {
        memory.memory_type =
            MemoryType::from_str(&type_str.to_lowercase()).map_err(EngramError::validation)?;
    }
    if let Some(content) = input.content {
        validate::content(&content)?;
        // A content change re-embeds and re-hashes.
        memory.embedding = Some(context.embedder.embed(&content).await?);
        memory.content_hash = Memory::hash_content(&content);
        memory.content = content;
    }
    if let Some(entities) = input.entities {
        memory.entities = entities;
    }

    context.storage.update(&memory)?;
    context.cache.invalidate_user(user_id);
    context
        .audit
        .record(user_id, "update_memory", memory.status.as_str(), None);

    info!(
        memory_id = %memory.id,
        status = %memory.status,
        importance = memory.importance,
        "memory updated"
    );

    Ok(UpdateOutput {
        memory_id: memory.id,
        new_status: memory.status.as_str().to_string(),
    })
}

pub fn spec() -> serde_json::Value {
    json!({
        "name": "update_memory",
        "description": "Updates specific fields of a memory, such as status (active, stale, irrelevant) or importance. Use this for memory hygiene and aging; use refine_knowledge when meaning changed.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "memory_id": {
                    "type": "string",
                    "format": "uuid",
                    "description": "The memory to update"
                },
                "status": {
                    "type": "string",
                    "enum": ["active", "stale", "irrelevant", "archived"],
                    "description": "New status for the memory"
                },
                "importance": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 10
                },
                "memory_type": {
                    "type": "string",
                    "enum": ["semantic", "preference", "procedural", "episodic", "meta"]
                },
                "content": {
                    "type": "string",
                    "description": "Corrected content text (triggers re-embedding). Prefer refine_knowledge for changes that represent learning."
                },
                "entities": {
                    "type": "array",
                    "items": {"type": "string"}
                }
            },
            "required": ["memory_id"]
        }
    })
}
