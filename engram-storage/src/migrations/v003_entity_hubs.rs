//! v003: entity_hubs — the per-user learned index nodes.

use rusqlite::Connection;

use engram_core::errors::EngramResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entity_hubs (
            id             TEXT PRIMARY KEY,
            user_id        TEXT NOT NULL,
            entity_name    TEXT NOT NULL,
            display_name   TEXT,
            canonical_name TEXT,
            category       TEXT,
            hub_type       TEXT NOT NULL DEFAULT 'concept',
            aliases        TEXT NOT NULL DEFAULT '[]',
            confidence     REAL NOT NULL DEFAULT 0.8,
            usage_count    INTEGER NOT NULL DEFAULT 1,
            memory_count   INTEGER NOT NULL DEFAULT 0,
            last_used      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            source         TEXT NOT NULL DEFAULT 'llm',
            embedding      BLOB,
            created_at     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            UNIQUE (user_id, entity_name)
        );

        CREATE INDEX IF NOT EXISTS idx_hubs_user_usage ON entity_hubs(user_id, usage_count DESC);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
