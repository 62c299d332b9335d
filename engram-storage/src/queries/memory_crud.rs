//! Insert, update, status transitions, cascade deletion, access tracking.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use engram_core::entity::MemoryEntityLink;
use engram_core::memory::{Memory, MemorySource, MemoryStatus, MemoryType};
use engram_core::traits::CascadeDeletion;
use engram_core::{EngramError, EngramResult};

use super::{f32_vec_to_bytes, link_ops, parse_dt, parse_uuid, OptionalRow};
use crate::to_storage_err;

/// Insert a single memory row. Callers own the transaction boundary.
pub fn insert_memory(conn: &Connection, memory: &Memory) -> EngramResult<()> {
    let entities_json = serde_json::to_string(&memory.entities)?;
    let metadata_json = serde_json::to_string(&memory.metadata)?;
    let embedding_blob = memory.embedding.as_deref().map(f32_vec_to_bytes);
    let dimensions = memory.embedding.as_ref().map(|e| e.len() as i64);

    conn.execute(
        "INSERT INTO memories (
            id, user_id, content, memory_type, status, embedding, dimensions,
            entities, domain, category, importance, confidence, source,
            source_id, metadata, superseded_by, access_count, last_accessed,
            created_at, updated_at, deleted_at, content_hash
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
            ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22
        )",
        params![
            memory.id.to_string(),
            memory.user_id.to_string(),
            memory.content,
            memory.memory_type.as_str(),
            memory.status.as_str(),
            embedding_blob,
            dimensions,
            entities_json,
            memory.domain,
            memory.category,
            memory.importance as i64,
            memory.confidence,
            memory.source.as_str(),
            memory.source_id,
            metadata_json,
            memory.superseded_by.map(|id| id.to_string()),
            memory.access_count as i64,
            memory.last_accessed.map(|t| t.to_rfc3339()),
            memory.created_at.to_rfc3339(),
            memory.updated_at.to_rfc3339(),
            memory.deleted_at.map(|t| t.to_rfc3339()),
            memory.content_hash,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Insert the memory row plus its entity links as one transaction.
pub fn insert_with_links(
    conn: &Connection,
    memory: &Memory,
    links: &[MemoryEntityLink],
) -> EngramResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("insert_with_links begin: {e}")))?;

    let result = (|| -> EngramResult<()> {
        insert_memory(&tx, memory)?;
        for link in links {
            link_ops::upsert_link(&tx, link)?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            tx.commit()
                .map_err(|e| to_storage_err(format!("insert_with_links commit: {e}")))?;
            Ok(())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

/// Bulk insert memories in one transaction. Returns the number inserted.
pub fn bulk_insert(conn: &Connection, memories: &[Memory]) -> EngramResult<usize> {
    if memories.is_empty() {
        return Ok(0);
    }
    conn.execute_batch("BEGIN IMMEDIATE")
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut count = 0;
    for memory in memories {
        if let Err(e) = insert_memory(conn, memory) {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e);
        }
        count += 1;
    }

    conn.execute_batch("COMMIT")
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count)
}

pub const MEMORY_COLUMNS: &str = "id, user_id, content, memory_type, status, embedding, dimensions,
     entities, domain, category, importance, confidence, source, source_id,
     metadata, superseded_by, access_count, last_accessed, created_at,
     updated_at, deleted_at, content_hash";

/// Get a single memory by id, scoped to its owner. Any status.
pub fn get_memory(conn: &Connection, user_id: Uuid, id: Uuid) -> EngramResult<Option<Memory>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1 AND user_id = ?2"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_row(params![id.to_string(), user_id.to_string()], |row| {
            Ok(row_to_memory(row))
        })
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    result.transpose()
}

/// Full-row update of a memory.
pub fn update_memory(conn: &Connection, memory: &Memory) -> EngramResult<()> {
    let entities_json = serde_json::to_string(&memory.entities)?;
    let metadata_json = serde_json::to_string(&memory.metadata)?;
    let embedding_blob = memory.embedding.as_deref().map(f32_vec_to_bytes);
    let dimensions = memory.embedding.as_ref().map(|e| e.len() as i64);

    let rows = conn
        .execute(
            "UPDATE memories SET
                content = ?3, memory_type = ?4, status = ?5, embedding = ?6,
                dimensions = ?7, entities = ?8, domain = ?9, category = ?10,
                importance = ?11, confidence = ?12, source = ?13,
                source_id = ?14, metadata = ?15, superseded_by = ?16,
                access_count = ?17, last_accessed = ?18, deleted_at = ?19,
                content_hash = ?20,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?1 AND user_id = ?2",
            params![
                memory.id.to_string(),
                memory.user_id.to_string(),
                memory.content,
                memory.memory_type.as_str(),
                memory.status.as_str(),
                embedding_blob,
                dimensions,
                entities_json,
                memory.domain,
                memory.category,
                memory.importance as i64,
                memory.confidence,
                memory.source.as_str(),
                memory.source_id,
                metadata_json,
                memory.superseded_by.map(|id| id.to_string()),
                memory.access_count as i64,
                memory.last_accessed.map(|t| t.to_rfc3339()),
                memory.deleted_at.map(|t| t.to_rfc3339()),
                memory.content_hash,
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    if rows == 0 {
        return Err(EngramError::not_found("memory", memory.id));
    }
    Ok(())
}

/// Status transition. Writes `superseded_by` alongside and keeps
/// `deleted_at` consistent with the `deleted` status.
pub fn set_status(
    conn: &Connection,
    user_id: Uuid,
    id: Uuid,
    status: MemoryStatus,
    superseded_by: Option<Uuid>,
) -> EngramResult<bool> {
    let deleted_at = if status == MemoryStatus::Deleted {
        Some(Utc::now().to_rfc3339())
    } else {
        None
    };
    let rows = conn
        .execute(
            "UPDATE memories SET
                status = ?3, superseded_by = ?4, deleted_at = ?5,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?1 AND user_id = ?2",
            params![
                id.to_string(),
                user_id.to_string(),
                status.as_str(),
                superseded_by.map(|s| s.to_string()),
                deleted_at,
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(rows > 0)
}

/// Delete a memory with cascade to edges and entity links, in one
/// transaction. Soft by default.
pub fn delete_cascade(
    conn: &Connection,
    user_id: Uuid,
    id: Uuid,
    hard: bool,
) -> EngramResult<CascadeDeletion> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("delete_cascade begin: {e}")))?;

    let result = (|| -> EngramResult<CascadeDeletion> {
        let existing = get_memory(&tx, user_id, id)?
            .ok_or_else(|| EngramError::not_found("memory", id))?;
        if existing.status == MemoryStatus::Deleted && !hard {
            return Err(EngramError::not_found("memory", id));
        }

        let edges_removed = super::edge_ops::delete_for_memory(&tx, user_id, id)?;
        let links_removed = link_ops::delete_links_for_memory(&tx, user_id, id)?;

        let deleted_at = if hard {
            tx.execute(
                "DELETE FROM memories WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), user_id.to_string()],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
            None
        } else {
            let now = Utc::now();
            tx.execute(
                "UPDATE memories SET
                    status = 'deleted', deleted_at = ?3,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), user_id.to_string(), now.to_rfc3339()],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
            Some(now)
        };

        Ok(CascadeDeletion {
            deleted_at,
            edges_removed,
            links_removed,
        })
    })();

    match result {
        Ok(cascade) => {
            tx.commit()
                .map_err(|e| to_storage_err(format!("delete_cascade commit: {e}")))?;
            Ok(cascade)
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

/// Dedup reinforcement: bump access count and confidence in one statement.
pub fn reinforce(
    conn: &Connection,
    user_id: Uuid,
    id: Uuid,
    confidence_delta: f64,
) -> EngramResult<()> {
    let rows = conn
        .execute(
            "UPDATE memories SET
                access_count = access_count + 1,
                confidence = MIN(1.0, confidence + ?3),
                last_accessed = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id.to_string(), confidence_delta],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if rows == 0 {
        return Err(EngramError::not_found("memory", id));
    }
    Ok(())
}

/// Increment access counters for memories a recall returned.
pub fn record_access(conn: &Connection, user_id: Uuid, ids: &[Uuid]) -> EngramResult<()> {
    for id in ids {
        conn.execute(
            "UPDATE memories SET
                access_count = access_count + 1,
                last_accessed = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id.to_string()],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

/// Parse a row (in `MEMORY_COLUMNS` order) into a Memory.
pub(crate) fn row_to_memory(row: &rusqlite::Row<'_>) -> EngramResult<Memory> {
    let id_str: String = row.get(0).map_err(|e| to_storage_err(e.to_string()))?;
    let user_str: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
    let type_str: String = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
    let status_str: String = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;
    let embedding_blob: Option<Vec<u8>> = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
    let entities_json: String = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;
    let source_str: String = row.get(12).map_err(|e| to_storage_err(e.to_string()))?;
    let metadata_json: String = row.get(14).map_err(|e| to_storage_err(e.to_string()))?;
    let superseded_str: Option<String> = row.get(15).map_err(|e| to_storage_err(e.to_string()))?;
    let last_accessed_str: Option<String> =
        row.get(17).map_err(|e| to_storage_err(e.to_string()))?;
    let created_str: String = row.get(18).map_err(|e| to_storage_err(e.to_string()))?;
    let updated_str: String = row.get(19).map_err(|e| to_storage_err(e.to_string()))?;
    let deleted_str: Option<String> = row.get(20).map_err(|e| to_storage_err(e.to_string()))?;

    let entities: Vec<String> = serde_json::from_str(&entities_json)
        .map_err(|e| to_storage_err(format!("parse entities: {e}")))?;
    let metadata: BTreeMap<String, String> = serde_json::from_str(&metadata_json)
        .map_err(|e| to_storage_err(format!("parse metadata: {e}")))?;

    Ok(Memory {
        id: parse_uuid(&id_str)?,
        user_id: parse_uuid(&user_str)?,
        content: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        memory_type: MemoryType::from_str(&type_str).map_err(to_storage_err)?,
        status: MemoryStatus::from_str(&status_str).map_err(to_storage_err)?,
        embedding: embedding_blob.map(|b| super::bytes_to_f32_vec(&b)),
        entities,
        domain: row.get(8).map_err(|e| to_storage_err(e.to_string()))?,
        category: row.get(9).map_err(|e| to_storage_err(e.to_string()))?,
        importance: row
            .get::<_, i64>(10)
            .map_err(|e| to_storage_err(e.to_string()))? as u8,
        confidence: row.get(11).map_err(|e| to_storage_err(e.to_string()))?,
        source: MemorySource::from_str(&source_str).map_err(to_storage_err)?,
        source_id: row.get(13).map_err(|e| to_storage_err(e.to_string()))?,
        metadata,
        superseded_by: superseded_str.as_deref().map(parse_uuid).transpose()?,
        access_count: row
            .get::<_, i64>(16)
            .map_err(|e| to_storage_err(e.to_string()))? as u64,
        last_accessed: last_accessed_str.as_deref().map(parse_dt).transpose()?,
        created_at: parse_dt(&created_str)?,
        updated_at: parse_dt(&updated_str)?,
        deleted_at: deleted_str.as_deref().map(parse_dt).transpose()?,
        content_hash: row.get(21).map_err(|e| to_storage_err(e.to_string()))?,
    })
}
