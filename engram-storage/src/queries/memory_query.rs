//! Filtered listings and aggregations over memories.

use rusqlite::{params, Connection};
use uuid::Uuid;

use engram_core::memory::{Memory, MemoryStatus};
use engram_core::models::MemoryStats;
use engram_core::traits::MemoryListQuery;
use engram_core::EngramResult;

use super::memory_crud::{row_to_memory, MEMORY_COLUMNS};
use super::parse_dt;
use crate::to_storage_err;

/// List memories for a user, newest first. `status: None` excludes deleted
/// and superseded rows.
pub fn list_by_user(
    conn: &Connection,
    user_id: Uuid,
    query: &MemoryListQuery,
) -> EngramResult<Vec<Memory>> {
    let mut conditions = vec!["user_id = ?1".to_string()];
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> =
        vec![Box::new(user_id.to_string())];
    let mut idx = 2;

    match query.status {
        Some(status) => {
            conditions.push(format!("status = ?{idx}"));
            params_vec.push(Box::new(status.as_str().to_string()));
            idx += 1;
        }
        None => conditions.push("status NOT IN ('deleted', 'superseded')".to_string()),
    }

    if let Some(memory_type) = query.memory_type {
        conditions.push(format!("memory_type = ?{idx}"));
        params_vec.push(Box::new(memory_type.as_str().to_string()));
        idx += 1;
    }

    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM memories
         WHERE {}
         ORDER BY created_at DESC
         LIMIT ?{idx} OFFSET ?{}",
        conditions.join(" AND "),
        idx + 1
    );
    params_vec.push(Box::new(query.limit as i64));
    params_vec.push(Box::new(query.offset as i64));

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let rows = stmt
        .query_map(params_refs.as_slice(), |row| Ok(row_to_memory(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(results)
}

pub fn count_by_user(
    conn: &Connection,
    user_id: Uuid,
    status: MemoryStatus,
) -> EngramResult<u64> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM memories WHERE user_id = ?1 AND status = ?2",
            params![user_id.to_string(), status.as_str()],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as u64)
}

/// Preference memories, importance-desc then newest-first.
pub fn get_preferences(conn: &Connection, user_id: Uuid, limit: usize) -> EngramResult<Vec<Memory>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories
             WHERE user_id = ?1 AND status = 'active' AND memory_type = 'preference'
             ORDER BY importance DESC, created_at DESC
             LIMIT ?2"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![user_id.to_string(), limit as i64], |row| {
            Ok(row_to_memory(row))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(results)
}

/// Aggregate statistics over a user's non-deleted memories.
pub fn memory_stats(conn: &Connection, user_id: Uuid) -> EngramResult<MemoryStats> {
    let row = conn
        .query_row(
            "SELECT
                COUNT(*),
                COUNT(CASE WHEN memory_type = 'preference' THEN 1 END),
                COUNT(CASE WHEN memory_type = 'semantic' THEN 1 END),
                COUNT(CASE WHEN memory_type = 'episodic' THEN 1 END),
                COUNT(CASE WHEN memory_type = 'procedural' THEN 1 END),
                COUNT(CASE WHEN memory_type = 'meta' THEN 1 END),
                COALESCE(AVG(importance), 0.0),
                MIN(created_at),
                MAX(created_at),
                COALESCE(SUM(access_count), 0)
             FROM memories
             WHERE user_id = ?1 AND status NOT IN ('deleted', 'superseded')",
            params![user_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, f64>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, i64>(9)?,
                ))
            },
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(MemoryStats {
        total_memories: row.0 as u64,
        preference_count: row.1 as u64,
        semantic_count: row.2 as u64,
        episodic_count: row.3 as u64,
        procedural_count: row.4 as u64,
        meta_count: row.5 as u64,
        avg_importance: row.6,
        first_memory_date: row.7.as_deref().map(parse_dt).transpose()?,
        last_memory_date: row.8.as_deref().map(parse_dt).transpose()?,
        total_accesses: row.9 as u64,
    })
}

/// Distinct active domains (≤50) and categories (≤100), for LLM context.
pub fn distinct_domains_categories(
    conn: &Connection,
    user_id: Uuid,
) -> EngramResult<(Vec<String>, Vec<String>)> {
    let collect = |sql: &str, limit: i64| -> EngramResult<Vec<String>> {
        let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map(params![user_id.to_string(), limit], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| to_storage_err(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| to_storage_err(e.to_string()))
    };

    let domains = collect(
        "SELECT DISTINCT domain FROM memories
         WHERE user_id = ?1 AND domain IS NOT NULL AND status = 'active'
         ORDER BY domain LIMIT ?2",
        50,
    )?;
    let categories = collect(
        "SELECT DISTINCT category FROM memories
         WHERE user_id = ?1 AND category IS NOT NULL AND status = 'active'
         ORDER BY category LIMIT ?2",
        100,
    )?;
    Ok((domains, categories))
}
