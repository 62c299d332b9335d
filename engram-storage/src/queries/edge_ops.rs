//! Knowledge-edge CRUD and the consolidation upsert.

use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use engram_core::graph::{EdgeType, KnowledgeEdge, NewEdge};
use engram_core::{EngramError, EngramResult};

use super::{parse_dt, parse_uuid, OptionalRow};
use crate::to_storage_err;

const EDGE_COLUMNS: &str = "id, user_id, from_id, to_id, edge_type, strength, confidence,
     causality, bidirectional, reason, created_at, updated_at";

/// Insert a new edge. A `(user, from, to, type)` collision surfaces as a
/// Conflict error.
pub fn insert_edge(conn: &Connection, edge: &NewEdge) -> EngramResult<KnowledgeEdge> {
    let id = Uuid::new_v4();
    let result = conn.execute(
        "INSERT INTO knowledge_edges (
            id, user_id, from_id, to_id, edge_type, strength, confidence,
            causality, bidirectional, reason
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id.to_string(),
            edge.user_id.to_string(),
            edge.from_id.to_string(),
            edge.to_id.to_string(),
            edge.edge_type.as_str(),
            edge.strength,
            edge.confidence,
            edge.causality as i32,
            edge.bidirectional as i32,
            edge.reason,
        ],
    );

    match result {
        Ok(_) => get_edge(conn, edge.user_id, id)?
            .ok_or_else(|| EngramError::internal("edge vanished after insert")),
        Err(e) if super::is_constraint_violation(&e) => Err(EngramError::Conflict {
            message: format!(
                "edge already exists: {} -{}-> {}",
                edge.from_id, edge.edge_type, edge.to_id
            ),
        }),
        Err(e) => Err(to_storage_err(e.to_string())),
    }
}

/// Insert-or-update. On conflict, strength is replaced and confidence takes
/// the max of stored and incoming, so confidence never decreases.
pub fn upsert_edge(conn: &Connection, edge: &NewEdge) -> EngramResult<KnowledgeEdge> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO knowledge_edges (
            id, user_id, from_id, to_id, edge_type, strength, confidence,
            causality, bidirectional, reason
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT (user_id, from_id, to_id, edge_type) DO UPDATE SET
            strength = excluded.strength,
            confidence = MAX(confidence, excluded.confidence),
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        params![
            id.to_string(),
            edge.user_id.to_string(),
            edge.from_id.to_string(),
            edge.to_id.to_string(),
            edge.edge_type.as_str(),
            edge.strength,
            edge.confidence,
            edge.causality as i32,
            edge.bidirectional as i32,
            edge.reason,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {EDGE_COLUMNS} FROM knowledge_edges
             WHERE user_id = ?1 AND from_id = ?2 AND to_id = ?3 AND edge_type = ?4"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let stored = stmt
        .query_row(
            params![
                edge.user_id.to_string(),
                edge.from_id.to_string(),
                edge.to_id.to_string(),
                edge.edge_type.as_str(),
            ],
            |row| Ok(row_to_edge(row)),
        )
        .map_err(|e| to_storage_err(e.to_string()))??;
    Ok(stored)
}

pub fn get_edge(conn: &Connection, user_id: Uuid, id: Uuid) -> EngramResult<Option<KnowledgeEdge>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {EDGE_COLUMNS} FROM knowledge_edges WHERE id = ?1 AND user_id = ?2"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    stmt.query_row(params![id.to_string(), user_id.to_string()], |row| {
        Ok(row_to_edge(row))
    })
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))?
    .transpose()
}

/// All edges starting at a memory, strongest first.
pub fn edges_from(
    conn: &Connection,
    user_id: Uuid,
    memory_id: Uuid,
    edge_type: Option<EdgeType>,
) -> EngramResult<Vec<KnowledgeEdge>> {
    edges_in_direction(conn, user_id, memory_id, "from_id", edge_type)
}

/// All edges pointing at a memory, strongest first.
pub fn edges_to(
    conn: &Connection,
    user_id: Uuid,
    memory_id: Uuid,
    edge_type: Option<EdgeType>,
) -> EngramResult<Vec<KnowledgeEdge>> {
    edges_in_direction(conn, user_id, memory_id, "to_id", edge_type)
}

fn edges_in_direction(
    conn: &Connection,
    user_id: Uuid,
    memory_id: Uuid,
    column: &str,
    edge_type: Option<EdgeType>,
) -> EngramResult<Vec<KnowledgeEdge>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match edge_type {
        Some(ty) => (
            format!(
                "SELECT {EDGE_COLUMNS} FROM knowledge_edges
                 WHERE user_id = ?1 AND {column} = ?2 AND edge_type = ?3
                 ORDER BY strength DESC"
            ),
            vec![
                Box::new(user_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(memory_id.to_string()),
                Box::new(ty.as_str().to_string()),
            ],
        ),
        None => (
            format!(
                "SELECT {EDGE_COLUMNS} FROM knowledge_edges
                 WHERE user_id = ?1 AND {column} = ?2
                 ORDER BY strength DESC"
            ),
            vec![
                Box::new(user_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(memory_id.to_string()),
            ],
        ),
    };

    collect_edges(conn, &sql, &params_vec)
}

/// All edges touching a memory in either direction.
pub fn all_edges_for(
    conn: &Connection,
    user_id: Uuid,
    memory_id: Uuid,
) -> EngramResult<Vec<KnowledgeEdge>> {
    let params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![
        Box::new(user_id.to_string()),
        Box::new(memory_id.to_string()),
    ];
    collect_edges(
        conn,
        &format!(
            "SELECT {EDGE_COLUMNS} FROM knowledge_edges
             WHERE user_id = ?1 AND (from_id = ?2 OR to_id = ?2)
             ORDER BY strength DESC"
        ),
        &params_vec,
    )
}

/// Every edge the user owns.
pub fn all_for_user(conn: &Connection, user_id: Uuid) -> EngramResult<Vec<KnowledgeEdge>> {
    let params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(user_id.to_string())];
    collect_edges(
        conn,
        &format!(
            "SELECT {EDGE_COLUMNS} FROM knowledge_edges
             WHERE user_id = ?1
             ORDER BY strength DESC"
        ),
        &params_vec,
    )
}

/// Remove every edge touching a memory. Returns the removed count.
pub fn delete_for_memory(conn: &Connection, user_id: Uuid, memory_id: Uuid) -> EngramResult<u64> {
    let count = conn
        .execute(
            "DELETE FROM knowledge_edges
             WHERE user_id = ?1 AND (from_id = ?2 OR to_id = ?2)",
            params![user_id.to_string(), memory_id.to_string()],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as u64)
}

fn collect_edges(
    conn: &Connection,
    sql: &str,
    params_vec: &[Box<dyn rusqlite::types::ToSql>],
) -> EngramResult<Vec<KnowledgeEdge>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(params_refs.as_slice(), |row| Ok(row_to_edge(row)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(results)
}

fn row_to_edge(row: &rusqlite::Row<'_>) -> EngramResult<KnowledgeEdge> {
    let id_str: String = row.get(0).map_err(|e| to_storage_err(e.to_string()))?;
    let user_str: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
    let from_str: String = row.get(2).map_err(|e| to_storage_err(e.to_string()))?;
    let to_str: String = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
    let type_str: String = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;
    let created_str: String = row.get(10).map_err(|e| to_storage_err(e.to_string()))?;
    let updated_str: String = row.get(11).map_err(|e| to_storage_err(e.to_string()))?;

    Ok(KnowledgeEdge {
        id: parse_uuid(&id_str)?,
        user_id: parse_uuid(&user_str)?,
        from_id: parse_uuid(&from_str)?,
        to_id: parse_uuid(&to_str)?,
        edge_type: EdgeType::from_str(&type_str).map_err(to_storage_err)?,
        strength: row.get(5).map_err(|e| to_storage_err(e.to_string()))?,
        confidence: row.get(6).map_err(|e| to_storage_err(e.to_string()))?,
        causality: row.get::<_, i32>(7).map_err(|e| to_storage_err(e.to_string()))? != 0,
        bidirectional: row.get::<_, i32>(8).map_err(|e| to_storage_err(e.to_string()))? != 0,
        reason: row.get(9).map_err(|e| to_storage_err(e.to_string()))?,
        created_at: parse_dt(&created_str)?,
        updated_at: parse_dt(&updated_str)?,
    })
}
