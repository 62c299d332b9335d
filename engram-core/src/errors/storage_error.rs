/// Storage-layer errors for SQLite operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("connection pool lock poisoned: {message}")]
    PoolPoisoned { message: String },

    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },
}
