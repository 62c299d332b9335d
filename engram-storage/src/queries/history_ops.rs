//! Consolidation audit rows.

use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use engram_core::models::{ConsolidationHistory, ConsolidationStatus};
use engram_core::EngramResult;

use super::{parse_dt, parse_uuid, OptionalRow};
use crate::to_storage_err;

pub fn insert(conn: &Connection, history: &ConsolidationHistory) -> EngramResult<()> {
    let patterns_json = serde_json::to_string(&history.patterns_detected)?;
    let entities_json = serde_json::to_string(&history.key_entities)?;

    conn.execute(
        "INSERT INTO consolidation_history (
            id, user_id, conversation_id, consolidation_date, transcript_length,
            claims_extracted, new_memories_created, merged_count,
            conflicts_resolved, edges_created, processing_time_ms,
            patterns_detected, key_entities, status, error_message
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            history.id.to_string(),
            history.user_id.to_string(),
            history.conversation_id,
            history.consolidation_date.to_rfc3339(),
            history.transcript_length as i64,
            history.claims_extracted as i64,
            history.new_memories_created as i64,
            history.merged_count as i64,
            history.conflicts_resolved as i64,
            history.edges_created as i64,
            history.processing_time_ms as i64,
            patterns_json,
            entities_json,
            history.status.as_str(),
            history.error_message,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

pub fn get(
    conn: &Connection,
    user_id: Uuid,
    id: Uuid,
) -> EngramResult<Option<ConsolidationHistory>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, user_id, conversation_id, consolidation_date,
                    transcript_length, claims_extracted, new_memories_created,
                    merged_count, conflicts_resolved, edges_created,
                    processing_time_ms, patterns_detected, key_entities,
                    status, error_message
             FROM consolidation_history
             WHERE id = ?1 AND user_id = ?2",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let result = stmt
        .query_row(params![id.to_string(), user_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, i64>(8)?,
                row.get::<_, i64>(9)?,
                row.get::<_, i64>(10)?,
                row.get::<_, String>(11)?,
                row.get::<_, String>(12)?,
                row.get::<_, String>(13)?,
                row.get::<_, Option<String>>(14)?,
            ))
        })
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let Some(row) = result else {
        return Ok(None);
    };

    let patterns: Vec<String> = serde_json::from_str(&row.11)
        .map_err(|e| to_storage_err(format!("parse patterns: {e}")))?;
    let key_entities: Vec<String> = serde_json::from_str(&row.12)
        .map_err(|e| to_storage_err(format!("parse key entities: {e}")))?;

    Ok(Some(ConsolidationHistory {
        id: parse_uuid(&row.0)?,
        user_id: parse_uuid(&row.1)?,
        conversation_id: row.2,
        consolidation_date: parse_dt(&row.3)?,
        transcript_length: row.4 as usize,
        claims_extracted: row.5 as usize,
        new_memories_created: row.6 as usize,
        merged_count: row.7 as usize,
        conflicts_resolved: row.8 as usize,
        edges_created: row.9 as usize,
        processing_time_ms: row.10 as u64,
        patterns_detected: patterns,
        key_entities,
        status: ConsolidationStatus::from_str(&row.13).map_err(to_storage_err)?,
        error_message: row.14,
    }))
}
