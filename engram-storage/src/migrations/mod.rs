//! Migration runner — version tracking, forward-only, transactional per migration.

mod v001_memories;
mod v002_knowledge_edges;
mod v003_entity_hubs;
mod v004_memory_entity_links;
mod v005_consolidation_history;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use engram_core::errors::EngramResult;

use crate::to_storage_err;

/// Total number of migrations.
pub const LATEST_VERSION: u32 = 5;

/// All migrations in order. Index 0 = v001, etc.
type MigrationFn = fn(&Connection) -> EngramResult<()>;

const MIGRATIONS: [(u32, &str, MigrationFn); 5] = [
    (1, "memories", v001_memories::migrate),
    (2, "knowledge_edges", v002_knowledge_edges::migrate),
    (3, "entity_hubs", v003_entity_hubs::migrate),
    (4, "memory_entity_links", v004_memory_entity_links::migrate),
    (5, "consolidation_history", v005_consolidation_history::migrate),
];

/// Get the current schema version from the database.
/// Returns 0 if the schema_version table doesn't exist yet.
pub fn current_version(conn: &Connection) -> EngramResult<u32> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version'")
        .and_then(|mut stmt| stmt.exists([]))
        .map_err(|e| to_storage_err(e.to_string()))?;

    if !exists {
        conn.execute_batch(
            "CREATE TABLE schema_version (
                version    INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        return Ok(0);
    }

    let version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    Ok(version)
}

/// Run all pending migrations. Forward-only, each wrapped in a transaction.
pub fn run_migrations(conn: &Connection) -> EngramResult<u32> {
    let current = current_version(conn)?;
    let mut applied = 0;

    if current >= LATEST_VERSION {
        debug!("database schema is up to date (v{current})");
        return Ok(0);
    }

    info!("running migrations: v{} → v{}", current, LATEST_VERSION);

    for &(version, name, migrate_fn) in &MIGRATIONS {
        if version <= current {
            continue;
        }

        debug!("applying migration v{version:03}: {name}");

        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| to_storage_err(format!("begin transaction for v{version:03}: {e}")))?;

        match migrate_fn(conn) {
            Ok(()) => {
                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    [version],
                )
                .map_err(|e| to_storage_err(format!("record version v{version:03}: {e}")))?;

                conn.execute_batch("COMMIT")
                    .map_err(|e| to_storage_err(format!("commit v{version:03}: {e}")))?;

                info!("applied migration v{version:03}: {name}");
                applied += 1;
            }
            Err(e) => {
                warn!("migration v{version:03} failed: {e}, rolling back");
                let _ = conn.execute_batch("ROLLBACK");
                return Err(engram_core::EngramError::Storage(
                    engram_core::errors::StorageError::MigrationFailed {
                        version,
                        reason: e.to_string(),
                    },
                ));
            }
        }
    }

    info!("applied {applied} migration(s), now at v{LATEST_VERSION}");
    Ok(applied)
}
