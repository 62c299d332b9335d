//! v001: memories table with inline embedding column.

use rusqlite::Connection;

use engram_core::errors::EngramResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memories (
            id            TEXT PRIMARY KEY,
            user_id       TEXT NOT NULL,
            content       TEXT NOT NULL,
            memory_type   TEXT NOT NULL,
            status        TEXT NOT NULL DEFAULT 'active',
            embedding     BLOB,
            dimensions    INTEGER,
            entities      TEXT NOT NULL DEFAULT '[]',
            domain        TEXT,
            category      TEXT,
            importance    INTEGER NOT NULL DEFAULT 5,
            confidence    REAL NOT NULL DEFAULT 0.8,
            source        TEXT NOT NULL DEFAULT 'conversation',
            source_id     TEXT,
            metadata      TEXT NOT NULL DEFAULT '{}',
            superseded_by TEXT,
            access_count  INTEGER NOT NULL DEFAULT 0,
            last_accessed TEXT,
            created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            deleted_at    TEXT,
            content_hash  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_memories_user_status ON memories(user_id, status);
        CREATE INDEX IF NOT EXISTS idx_memories_user_type ON memories(user_id, memory_type);
        CREATE INDEX IF NOT EXISTS idx_memories_user_domain ON memories(user_id, domain);
        CREATE INDEX IF NOT EXISTS idx_memories_content_hash ON memories(user_id, content_hash);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
