//! Migration runner behaviour: forward-only, idempotent, version-tracked.

use engram_storage::migrations;
use engram_storage::pool::pragmas;

#[test]
fn migrations_apply_once_and_are_idempotent() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    pragmas::apply_pragmas(&conn).unwrap();

    let applied = migrations::run_migrations(&conn).unwrap();
    assert_eq!(applied, migrations::LATEST_VERSION);
    assert_eq!(
        migrations::current_version(&conn).unwrap(),
        migrations::LATEST_VERSION
    );

    // Second run is a no-op.
    assert_eq!(migrations::run_migrations(&conn).unwrap(), 0);
}

#[test]
fn schema_has_all_tables() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    migrations::run_migrations(&conn).unwrap();

    for table in [
        "memories",
        "knowledge_edges",
        "entity_hubs",
        "memory_entity_links",
        "consolidation_history",
    ] {
        let exists: bool = conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1")
            .and_then(|mut stmt| stmt.exists([table]))
            .unwrap();
        assert!(exists, "missing table {table}");
    }
}

#[test]
fn file_backed_database_uses_wal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engram.db");
    let engine = engram_storage::StorageEngine::open(&path, 2).unwrap();
    engine
        .pool()
        .writer
        .with_conn_sync(|conn| {
            assert!(pragmas::verify_wal_mode(conn).unwrap());
            Ok(())
        })
        .unwrap();
}
