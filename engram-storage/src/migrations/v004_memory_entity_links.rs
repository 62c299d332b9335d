//! v004: memory_entity_links join table.

use rusqlite::Connection;

use engram_core::errors::EngramResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memory_entity_links (
            memory_id       TEXT NOT NULL,
            entity_id       TEXT NOT NULL,
            user_id         TEXT NOT NULL,
            strength        REAL NOT NULL DEFAULT 0.5,
            is_primary      INTEGER NOT NULL DEFAULT 0,
            mention_count   INTEGER NOT NULL DEFAULT 1,
            context_snippet TEXT,
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (memory_id, entity_id)
        );

        CREATE INDEX IF NOT EXISTS idx_links_user_entity ON memory_entity_links(user_id, entity_id);
        CREATE INDEX IF NOT EXISTS idx_links_memory ON memory_entity_links(memory_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
