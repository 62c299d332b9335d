//! Entity-hub CRUD, race-safe get_or_create, usage tracking, search.

use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use engram_core::entity::{EntityHub, EntitySource, HubType, NewEntityHub};
use engram_core::{EngramError, EngramResult};

use super::{f32_vec_to_bytes, parse_dt, parse_uuid, OptionalRow};
use crate::to_storage_err;

const HUB_COLUMNS: &str = "id, user_id, entity_name, display_name, canonical_name, category,
     hub_type, aliases, confidence, usage_count, memory_count, last_used,
     source, embedding, created_at, updated_at";

/// Insert a hub. The entity name is normalised to its lowercase key here.
/// A `(user, entity_name)` collision surfaces as a Conflict error.
pub fn insert_hub(conn: &Connection, hub: &NewEntityHub) -> EngramResult<EntityHub> {
    let id = Uuid::new_v4();
    let name_key = hub.entity_name.trim().to_lowercase();
    let aliases_json = serde_json::to_string(&hub.aliases)?;
    let embedding_blob = hub.embedding.as_deref().map(f32_vec_to_bytes);

    let result = conn.execute(
        "INSERT INTO entity_hubs (
            id, user_id, entity_name, display_name, canonical_name, category,
            hub_type, aliases, confidence, source, embedding
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id.to_string(),
            hub.user_id.to_string(),
            name_key,
            hub.display_name,
            hub.canonical_name,
            hub.category,
            hub.hub_type.as_str(),
            aliases_json,
            hub.confidence,
            hub.source.as_str(),
            embedding_blob,
        ],
    );

    match result {
        Ok(_) => get_by_id(conn, hub.user_id, id)?
            .ok_or_else(|| EngramError::internal("entity hub vanished after insert")),
        Err(e) if super::is_constraint_violation(&e) => Err(EngramError::Conflict {
            message: format!("entity hub already exists: {name_key}"),
        }),
        Err(e) => Err(to_storage_err(e.to_string())),
    }
}

pub fn get_by_id(conn: &Connection, user_id: Uuid, id: Uuid) -> EngramResult<Option<EntityHub>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {HUB_COLUMNS} FROM entity_hubs WHERE id = ?1 AND user_id = ?2"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    stmt.query_row(params![id.to_string(), user_id.to_string()], |row| {
        Ok(row_to_hub(row))
    })
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))?
    .transpose()
}

/// Case-insensitive lookup by name.
pub fn get_by_name(
    conn: &Connection,
    user_id: Uuid,
    entity_name: &str,
) -> EngramResult<Option<EntityHub>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {HUB_COLUMNS} FROM entity_hubs
             WHERE user_id = ?1 AND entity_name = LOWER(TRIM(?2))"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    stmt.query_row(params![user_id.to_string(), entity_name], |row| {
        Ok(row_to_hub(row))
    })
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))?
    .transpose()
}

/// Fetch-or-insert keyed on `(user_id, entity_name)`. Race-safe: a
/// concurrent insert loses the unique-constraint race and re-fetches.
pub fn get_or_create(
    conn: &Connection,
    user_id: Uuid,
    entity_name: &str,
    hub_type: HubType,
    category: Option<&str>,
    source: EntitySource,
    confidence: f64,
) -> EngramResult<(EntityHub, bool)> {
    if let Some(existing) = get_by_name(conn, user_id, entity_name)? {
        return Ok((existing, false));
    }

    let new_hub = NewEntityHub {
        user_id,
        entity_name: entity_name.trim().to_lowercase(),
        display_name: Some(entity_name.trim().to_string()),
        canonical_name: None,
        category: category.map(str::to_string),
        hub_type,
        aliases: Vec::new(),
        confidence,
        source,
        embedding: None,
    };

    match insert_hub(conn, &new_hub) {
        Ok(created) => Ok((created, true)),
        Err(EngramError::Conflict { .. }) => {
            let existing = get_by_name(conn, user_id, entity_name)?.ok_or_else(|| {
                EngramError::internal("entity hub conflict without existing row")
            })?;
            Ok((existing, false))
        }
        Err(e) => Err(e),
    }
}

/// usage_count + 1, last_used refreshed.
pub fn touch_usage(conn: &Connection, user_id: Uuid, hub_id: Uuid) -> EngramResult<()> {
    conn.execute(
        "UPDATE entity_hubs SET
            usage_count = usage_count + 1,
            last_used = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = ?1 AND user_id = ?2",
        params![hub_id.to_string(), user_id.to_string()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// The user's most-used hubs, optionally filtered by type.
pub fn top_by_usage(
    conn: &Connection,
    user_id: Uuid,
    limit: usize,
    hub_type: Option<HubType>,
) -> EngramResult<Vec<EntityHub>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match hub_type {
        Some(ty) => (
            format!(
                "SELECT {HUB_COLUMNS} FROM entity_hubs
                 WHERE user_id = ?1 AND hub_type = ?2
                 ORDER BY usage_count DESC, last_used DESC
                 LIMIT ?3"
            ),
            vec![
                Box::new(user_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(ty.as_str().to_string()),
                Box::new(limit as i64),
            ],
        ),
        None => (
            format!(
                "SELECT {HUB_COLUMNS} FROM entity_hubs
                 WHERE user_id = ?1
                 ORDER BY usage_count DESC, last_used DESC
                 LIMIT ?2"
            ),
            vec![
                Box::new(user_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit as i64),
            ],
        ),
    };

    collect_hubs(conn, &sql, &params_vec)
}

/// Substring search over names, display names, and aliases.
pub fn search(conn: &Connection, user_id: Uuid, query: &str) -> EngramResult<Vec<EntityHub>> {
    let pattern = format!("%{}%", query.trim().to_lowercase());
    let params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![
        Box::new(user_id.to_string()),
        Box::new(pattern),
    ];
    collect_hubs(
        conn,
        &format!(
            "SELECT {HUB_COLUMNS} FROM entity_hubs
             WHERE user_id = ?1 AND (
                entity_name LIKE ?2
                OR LOWER(COALESCE(display_name, '')) LIKE ?2
                OR LOWER(COALESCE(canonical_name, '')) LIKE ?2
                OR LOWER(aliases) LIKE ?2
             )
             ORDER BY usage_count DESC
             LIMIT 50"
        ),
        &params_vec,
    )
}

fn collect_hubs(
    conn: &Connection,
    sql: &str,
    params_vec: &[Box<dyn rusqlite::types::ToSql>],
) -> EngramResult<Vec<EntityHub>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(params_refs.as_slice(), |row| Ok(row_to_hub(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(results)
}

fn row_to_hub(row: &rusqlite::Row<'_>) -> EngramResult<EntityHub> {
    let id_str: String = row.get(0).map_err(|e| to_storage_err(e.to_string()))?;
    let user_str: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
    let type_str: String = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;
    let aliases_json: String = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;
    let last_used_str: String = row.get(11).map_err(|e| to_storage_err(e.to_string()))?;
    let source_str: String = row.get(12).map_err(|e| to_storage_err(e.to_string()))?;
    let embedding_blob: Option<Vec<u8>> = row.get(13).map_err(|e| to_storage_err(e.to_string()))?;
    let created_str: String = row.get(14).map_err(|e| to_storage_err(e.to_string()))?;
    let updated_str: String = row.get(15).map_err(|e| to_storage_err(e.to_string()))?;

    let aliases: Vec<String> = serde_json::from_str(&aliases_json)
        .map_err(|e| to_storage_err(format!("parse aliases: {e}")))?;

    Ok(EntityHub {
        id: parse_uuid(&id_str)?,
        user_id: parse_uuid(&user_str)?,
        entity_name: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        display_name: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        canonical_name: row.get(4).map_err(|e| to_storage_err(e.to_string()))?,
        category: row.get(5).map_err(|e| to_storage_err(e.to_string()))?,
        hub_type: HubType::from_str(&type_str).map_err(to_storage_err)?,
        aliases,
        confidence: row.get(8).map_err(|e| to_storage_err(e.to_string()))?,
        usage_count: row.get::<_, i64>(9).map_err(|e| to_storage_err(e.to_string()))? as u64,
        memory_count: row.get::<_, i64>(10).map_err(|e| to_storage_err(e.to_string()))? as u64,
        last_used: parse_dt(&last_used_str)?,
        source: EntitySource::from_str(&source_str).map_err(to_storage_err)?,
        embedding: embedding_blob.map(|b| super::bytes_to_f32_vec(&b)),
        created_at: parse_dt(&created_str)?,
        updated_at: parse_dt(&updated_str)?,
    })
}
