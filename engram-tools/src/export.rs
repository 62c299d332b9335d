//! Memory export (JSON/CSV) and the JSON import counterpart.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use engram_core::memory::{Memory, MemorySource, MemoryStatus, MemoryType};
use engram_core::models::ExportFormat;
use engram_core::{EngramError, EngramResult};

/// Render memories in the requested encoding. Embeddings are excluded
/// unless explicitly asked for.
pub fn render(
    memories: &[Memory],
    format: ExportFormat,
    include_embeddings: bool,
) -> serde_json::Value {
    match format {
        ExportFormat::Json => json!(memories
            .iter()
            .map(|m| export_item(m, include_embeddings))
            .collect::<Vec<_>>()),
        ExportFormat::Csv => json!(render_csv(memories, include_embeddings)),
    }
}

fn export_item(memory: &Memory, include_embeddings: bool) -> serde_json::Value {
    let mut item = json!({
        "id": memory.id.to_string(),
        "content": memory.content,
        "memory_type": memory.memory_type.as_str(),
        "entities": memory.entities,
        "domain": memory.domain,
        "category": memory.category,
        "importance": memory.importance,
        "confidence": memory.confidence,
        "status": memory.status.as_str(),
        "source": memory.source.as_str(),
        "source_id": memory.source_id,
        "access_count": memory.access_count,
        "created_at": memory.created_at.to_rfc3339(),
        "updated_at": memory.updated_at.to_rfc3339(),
        "last_accessed": memory.last_accessed.map(|t| t.to_rfc3339()),
        "metadata": memory.metadata,
    });
    if include_embeddings {
        item["embedding"] = json!(memory.embedding);
    }
    item
}

const CSV_HEADERS: [&str; 13] = [
    "id",
    "content",
    "memory_type",
    "entities",
    "importance",
    "confidence",
    "status",
    "source",
    "source_id",
    "access_count",
    "created_at",
    "updated_at",
    "last_accessed",
];

fn render_csv(memories: &[Memory], include_embeddings: bool) -> String {
    let mut out = String::new();
    let mut headers: Vec<&str> = CSV_HEADERS.to_vec();
    if include_embeddings {
        headers.push("embedding");
    }
    out.push_str(&headers.join(","));
    out.push('\n');

    for memory in memories {
        let mut fields = vec![
            memory.id.to_string(),
            csv_quote(&memory.content),
            memory.memory_type.as_str().to_string(),
            csv_quote(&serde_json::to_string(&memory.entities).unwrap_or_default()),
            memory.importance.to_string(),
            memory.confidence.to_string(),
            memory.status.as_str().to_string(),
            memory.source.as_str().to_string(),
            memory.source_id.clone().unwrap_or_default(),
            memory.access_count.to_string(),
            memory.created_at.to_rfc3339(),
            memory.updated_at.to_rfc3339(),
            memory
                .last_accessed
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        ];
        if include_embeddings {
            fields.push(csv_quote(
                &serde_json::to_string(&memory.embedding).unwrap_or_default(),
            ));
        }
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// RFC 4180 quoting: wrap in quotes, double interior quotes.
fn csv_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// One memory as it appears in a JSON export.
#[derive(Debug, Deserialize)]
struct ImportItem {
    id: Uuid,
    content: String,
    memory_type: String,
    #[serde(default)]
    entities: Vec<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    category: Option<String>,
    importance: u8,
    #[serde(default = "default_confidence")]
    confidence: f64,
    status: String,
    #[serde(default)]
    source_id: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

fn default_confidence() -> f64 {
    0.8
}

/// Parse a JSON export back into memories owned by `user_id`, preserving
/// id, content, entities, type, importance, and status.
pub fn parse_import(user_id: Uuid, data: &serde_json::Value) -> EngramResult<Vec<Memory>> {
    let items: Vec<ImportItem> = serde_json::from_value(data.clone())
        .map_err(|e| EngramError::validation(format!("import data malformed: {e}")))?;

    let now = Utc::now();
    let mut memories = Vec::with_capacity(items.len());
    for item in items {
        let memory_type = MemoryType::from_str(&item.memory_type)
            .map_err(EngramError::validation)?;
        let status = MemoryStatus::from_str(&item.status).map_err(EngramError::validation)?;
        engram_core::validate::importance(item.importance)?;
        engram_core::validate::content(&item.content)?;

        memories.push(Memory {
            id: item.id,
            user_id,
            content_hash: Memory::hash_content(&item.content),
            content: item.content,
            memory_type,
            status,
            embedding: item.embedding,
            entities: item.entities,
            domain: item.domain,
            category: item.category,
            importance: item.importance,
            confidence: item.confidence,
            source: MemorySource::Import,
            source_id: item.source_id,
            metadata: item.metadata,
            superseded_by: None,
            access_count: 0,
            last_accessed: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
    }
    Ok(memories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::memory_named;

    #[test]
    fn json_export_import_preserves_identity_fields() {
        let user = Uuid::new_v4();
        let mut memory = memory_named(user, "I prefer espresso", vec![1.0, 0.0]);
        memory.memory_type = MemoryType::Preference;
        memory.entities = vec!["espresso".to_string()];
        memory.importance = 8;

        let exported = render(std::slice::from_ref(&memory), ExportFormat::Json, false);
        let imported = parse_import(user, &exported).unwrap();

        assert_eq!(imported.len(), 1);
        let back = &imported[0];
        assert_eq!(back.id, memory.id);
        assert_eq!(back.content, memory.content);
        assert_eq!(back.entities, memory.entities);
        assert_eq!(back.memory_type, memory.memory_type);
        assert_eq!(back.importance, memory.importance);
        assert_eq!(back.status, memory.status);
        // Embeddings were excluded, and that is fine.
        assert!(back.embedding.is_none());
    }

    #[test]
    fn csv_export_quotes_content() {
        let user = Uuid::new_v4();
        let memory = memory_named(user, "content with, comma and \"quotes\"", vec![1.0, 0.0]);
        let rendered = render(&[memory], ExportFormat::Csv, false);
        let csv = rendered.as_str().unwrap();

        assert!(csv.starts_with("id,content,"));
        assert!(csv.contains("\"content with, comma and \"\"quotes\"\"\""));
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn malformed_import_is_a_validation_error() {
        let err = parse_import(Uuid::new_v4(), &json!({"not": "an array"})).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }
}
