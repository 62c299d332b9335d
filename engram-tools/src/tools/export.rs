//! Tool: export_memories — data portability, plus the import
//! counterpart that closes the round trip.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use engram_core::memory::MemoryType;
use engram_core::models::ExportFormat;
use engram_core::traits::{IMemoryStorage, MemoryListQuery};
use engram_core::{EngramError, EngramResult};

use crate::context::EngramContext;
use crate::export as codec;

const EXPORT_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct ExportInput {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub memory_type: Option<String>,
    #[serde(default)]
    pub include_embeddings: bool,
}

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportOutput {
    pub format: String,
    pub count: usize,
    pub data: serde_json::Value,
    pub export_date: DateTime<Utc>,
    pub file_size_bytes: usize,
}

pub async fn export_memories(
    context: &EngramContext,
    user_id: Uuid,
    input: ExportInput,
) -> EngramResult<ExportOutput> {
    let format = ExportFormat::from_str(&input.format.to_lowercase()).unwrap_or(ExportFormat::Json);
    let memory_type = input
        .memory_type
        .as_deref()
        .map(|t| MemoryType::from_str(&t.to_lowercase()).map_err(EngramError::validation))
        .transpose()?;

    let memories = context.storage.list_by_user(
        user_id,
        &MemoryListQuery {
            limit: EXPORT_LIMIT,
            offset: 0,
            memory_type,
            status: None,
        },
    )?;

    let data = codec::render(&memories, format, input.include_embeddings);
    let file_size_bytes = match &data {
        serde_json::Value::String(csv) => csv.len(),
        other => serde_json::to_string(other)?.len(),
    };

    context.audit.record(
        user_id,
        "export_memories",
        format.as_str(),
        Some(format!("{} memories", memories.len())),
    );
    info!(
        memories_count = memories.len(),
        format = %format,
        size_bytes = file_size_bytes,
        "export completed"
    );

    Ok(ExportOutput {
        format: format.as_str().to_string(),
        count: memories.len(),
        data,
        export_date: Utc::now(),
        file_size_bytes,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportOutput {
    pub imported: usize,
}

/// Import a JSON export. Ids, content, entities, type, importance, and
/// status are preserved; embeddings regenerate lazily if absent.
pub async fn import_memories(
    context: &EngramContext,
    user_id: Uuid,
    data: &serde_json::Value,
) -> EngramResult<ImportOutput> {
    let memories = codec::parse_import(user_id, data)?;
    let imported = context.storage.create_bulk(&memories)?;
    context.cache.invalidate_user(user_id);

    context
        .audit
        .record(user_id, "import_memories", "ok", Some(format!("{imported} rows")));
    Ok(ImportOutput { imported })
}

pub fn spec() -> serde_json::Value {
    json!({
        "name": "export_memories",
        "description": "Export user memories for backup or analysis. Supports JSON and CSV formats.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "enum": ["json", "csv"],
                    "default": "json"
                },
                "memory_type": {
                    "type": "string",
                    "enum": ["episodic", "semantic", "preference", "procedural", "meta"],
                    "description": "Filter by memory type"
                },
                "include_embeddings": {
                    "type": "boolean",
                    "default": false,
                    "description": "Include vector embeddings (significantly increases size)"
                }
            }
        }
    })
}
