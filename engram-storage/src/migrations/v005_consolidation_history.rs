//! v005: consolidation_history audit rows.

use rusqlite::Connection;

use engram_core::errors::EngramResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS consolidation_history (
            id                   TEXT PRIMARY KEY,
            user_id              TEXT NOT NULL,
            conversation_id      TEXT,
            consolidation_date   TEXT NOT NULL,
            transcript_length    INTEGER NOT NULL,
            claims_extracted     INTEGER NOT NULL DEFAULT 0,
            new_memories_created INTEGER NOT NULL DEFAULT 0,
            merged_count         INTEGER NOT NULL DEFAULT 0,
            conflicts_resolved   INTEGER NOT NULL DEFAULT 0,
            edges_created        INTEGER NOT NULL DEFAULT 0,
            processing_time_ms   INTEGER NOT NULL DEFAULT 0,
            patterns_detected    TEXT NOT NULL DEFAULT '[]',
            key_entities         TEXT NOT NULL DEFAULT '[]',
            status               TEXT NOT NULL DEFAULT 'pending',
            error_message        TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_history_user_date
            ON consolidation_history(user_id, consolidation_date DESC);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
