//! Memory ↔ entity-hub join rows, with hub counter maintenance.

use rusqlite::{params, Connection};
use uuid::Uuid;

use engram_core::entity::MemoryEntityLink;
use engram_core::EngramResult;

use super::{parse_uuid, OptionalRow};
use crate::to_storage_err;

/// Upsert a link row. On `(memory_id, entity_id)` conflict the greater
/// strength wins and `mention_count` is incremented. A fresh insert bumps
/// the hub's `memory_count`.
pub fn upsert_link(conn: &Connection, link: &MemoryEntityLink) -> EngramResult<()> {
    let existed: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM memory_entity_links WHERE memory_id = ?1 AND entity_id = ?2",
            params![link.memory_id.to_string(), link.entity_id.to_string()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO memory_entity_links (
            memory_id, entity_id, user_id, strength, is_primary,
            mention_count, context_snippet
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT (memory_id, entity_id) DO UPDATE SET
            strength = MAX(strength, excluded.strength),
            mention_count = mention_count + 1",
        params![
            link.memory_id.to_string(),
            link.entity_id.to_string(),
            link.user_id.to_string(),
            link.strength,
            link.is_primary as i32,
            link.mention_count as i64,
            link.context_snippet,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    if existed.is_none() {
        conn.execute(
            "UPDATE entity_hubs SET memory_count = memory_count + 1
             WHERE id = ?1 AND user_id = ?2",
            params![link.entity_id.to_string(), link.user_id.to_string()],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

pub fn links_for_memory(
    conn: &Connection,
    user_id: Uuid,
    memory_id: Uuid,
) -> EngramResult<Vec<MemoryEntityLink>> {
    let mut stmt = conn
        .prepare(
            "SELECT memory_id, entity_id, user_id, strength, is_primary,
                    mention_count, context_snippet
             FROM memory_entity_links
             WHERE user_id = ?1 AND memory_id = ?2
             ORDER BY strength DESC",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![user_id.to_string(), memory_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, i32>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        let (memory_str, entity_str, user_str, strength, is_primary, mentions, snippet) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        results.push(MemoryEntityLink {
            memory_id: parse_uuid(&memory_str)?,
            entity_id: parse_uuid(&entity_str)?,
            user_id: parse_uuid(&user_str)?,
            strength,
            is_primary: is_primary != 0,
            mention_count: mentions as u64,
            context_snippet: snippet,
        });
    }
    Ok(results)
}

/// Remove every link touching a memory, decrementing hub memory counts.
/// Returns the removed link count.
pub fn delete_links_for_memory(
    conn: &Connection,
    user_id: Uuid,
    memory_id: Uuid,
) -> EngramResult<u64> {
    conn.execute(
        "UPDATE entity_hubs SET memory_count = MAX(0, memory_count - 1)
         WHERE user_id = ?1 AND id IN (
            SELECT entity_id FROM memory_entity_links
            WHERE user_id = ?1 AND memory_id = ?2
         )",
        params![user_id.to_string(), memory_id.to_string()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let count = conn
        .execute(
            "DELETE FROM memory_entity_links WHERE user_id = ?1 AND memory_id = ?2",
            params![user_id.to_string(), memory_id.to_string()],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as u64)
}

/// Active memory ids linked to any of the named hubs, excluding given ids.
pub fn memory_ids_for_entity_names(
    conn: &Connection,
    user_id: Uuid,
    entity_names: &[String],
    exclude: &[Uuid],
    limit: usize,
) -> EngramResult<Vec<Uuid>> {
    if entity_names.is_empty() || limit == 0 {
        return Ok(vec![]);
    }

    let name_placeholders = (0..entity_names.len())
        .map(|i| format!("?{}", i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let exclude_clause = if exclude.is_empty() {
        String::new()
    } else {
        let placeholders = (0..exclude.len())
            .map(|i| format!("?{}", i + 2 + entity_names.len()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("AND m.id NOT IN ({placeholders})")
    };
    let limit_idx = 2 + entity_names.len() + exclude.len();

    let sql = format!(
        "SELECT DISTINCT m.id
         FROM memory_entity_links mel
         JOIN entity_hubs eh ON eh.id = mel.entity_id
         JOIN memories m ON m.id = mel.memory_id
         WHERE mel.user_id = ?1
           AND eh.entity_name IN ({name_placeholders})
           AND m.status = 'active'
           {exclude_clause}
         LIMIT ?{limit_idx}"
    );

    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> =
        vec![Box::new(user_id.to_string())];
    for name in entity_names {
        params_vec.push(Box::new(name.trim().to_lowercase()));
    }
    for id in exclude {
        params_vec.push(Box::new(id.to_string()));
    }
    params_vec.push(Box::new(limit as i64));

    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(params_refs.as_slice(), |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        let id = row.map_err(|e| to_storage_err(e.to_string()))?;
        results.push(parse_uuid(&id)?);
    }
    Ok(results)
}
