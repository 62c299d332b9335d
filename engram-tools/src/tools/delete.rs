//! Tool: delete_memory — soft by default, hard on request, edges cascade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use engram_core::EngramResult;

use crate::context::EngramContext;

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteInput {
    pub memory_id: Uuid,
    #[serde(default)]
    pub hard_delete: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutput {
    pub memory_id: Uuid,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deletion_type: String,
    pub related_edges_removed: u64,
}

pub async fn delete_memory(
    context: &EngramContext,
    user_id: Uuid,
    input: DeleteInput,
) -> EngramResult<DeleteOutput> {
    let cascade = context
        .processor
        .delete_memory(user_id, input.memory_id, input.hard_delete)?;

    let deletion_type = if input.hard_delete { "hard" } else { "soft" };
    context
        .audit
        .record(user_id, "delete_memory", deletion_type, None);

    info!(
        memory_id = %input.memory_id,
        deletion_type,
        edges_removed = cascade.edges_removed,
        "memory deleted"
    );

    Ok(DeleteOutput {
        memory_id: input.memory_id,
        deleted: true,
        deleted_at: cascade.deleted_at.or_else(|| Some(Utc::now())),
        deletion_type: deletion_type.to_string(),
        related_edges_removed: cascade.edges_removed,
    })
}

pub fn spec() -> serde_json::Value {
    json!({
        "name": "delete_memory",
        "description": "Delete a specific memory. Performs soft-delete by default (retained for a grace period). Use hard_delete for immediate permanent deletion.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "memory_id": {
                    "type": "string",
                    "format": "uuid",
                    "description": "ID of the memory to delete"
                },
                "hard_delete": {
                    "type": "boolean",
                    "default": false,
                    "description": "Whether to permanently delete (vs soft-delete)"
                }
            },
            "required": ["memory_id"]
        }
    })
}
