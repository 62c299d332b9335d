//! v002: knowledge_edges with per-user uniqueness and no self-edges.

use rusqlite::Connection;

use engram_core::errors::EngramResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS knowledge_edges (
            id            TEXT PRIMARY KEY,
            user_id       TEXT NOT NULL,
            from_id       TEXT NOT NULL,
            to_id         TEXT NOT NULL,
            edge_type     TEXT NOT NULL,
            strength      REAL NOT NULL DEFAULT 0.7,
            confidence    REAL NOT NULL DEFAULT 0.8,
            causality     INTEGER NOT NULL DEFAULT 0,
            bidirectional INTEGER NOT NULL DEFAULT 0,
            reason        TEXT,
            created_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            CHECK (from_id <> to_id),
            UNIQUE (user_id, from_id, to_id, edge_type)
        );

        CREATE INDEX IF NOT EXISTS idx_edges_user_from ON knowledge_edges(user_id, from_id);
        CREATE INDEX IF NOT EXISTS idx_edges_user_to ON knowledge_edges(user_id, to_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
