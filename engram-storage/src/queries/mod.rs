//! Query modules, one per table family.

pub mod edge_ops;
pub mod history_ops;
pub mod hub_ops;
pub mod link_ops;
pub mod memory_crud;
pub mod memory_query;
pub mod vector_search;

use chrono::{DateTime, Utc};

use engram_core::errors::EngramResult;

use crate::to_storage_err;

/// Parse an RFC 3339 timestamp stored as TEXT.
pub(crate) fn parse_dt(s: &str) -> EngramResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("parse datetime '{s}': {e}")))
}

/// Parse a UUID stored as TEXT.
pub(crate) fn parse_uuid(s: &str) -> EngramResult<uuid::Uuid> {
    uuid::Uuid::parse_str(s).map_err(|e| to_storage_err(format!("parse uuid '{s}': {e}")))
}

/// Convert f32 slice to bytes (little-endian).
pub(crate) fn f32_vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes back to f32 vec.
pub(crate) fn bytes_to_f32_vec(bytes: &[u8]) -> Vec<f32> {
    let mut result = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        result.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    result
}

/// Helper trait to make `query_row` return `Option` on not-found.
pub(crate) trait OptionalRow<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalRow<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Whether a rusqlite error is a unique/check constraint violation.
pub(crate) fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    )
}
