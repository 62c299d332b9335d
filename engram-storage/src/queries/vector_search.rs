//! Brute-force cosine similarity scan with SQL-level filters.

use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use engram_core::memory::{Memory, MemoryStatus};
use engram_core::models::RecallFilters;
use engram_core::EngramResult;

use super::{bytes_to_f32_vec, memory_crud, parse_uuid};
use crate::to_storage_err;

/// Search a user's memories by vector similarity, honouring the filters at
/// the SQL layer. Returns (memory, cosine) pairs, similarity descending.
///
/// Embeddings are stored as little-endian f32 BLOBs in the memories table;
/// the scan deserialises only matching rows and skips dimension mismatches
/// without decoding the full vector.
pub fn search_vector(
    conn: &Connection,
    user_id: Uuid,
    query_embedding: &[f32],
    filters: &RecallFilters,
    limit: usize,
) -> EngramResult<Vec<(Memory, f64)>> {
    let query_norm_sq: f64 = query_embedding
        .iter()
        .map(|x| (*x as f64) * (*x as f64))
        .sum();
    if query_norm_sq == 0.0 {
        return Ok(vec![]);
    }

    let mut conditions = vec!["user_id = ?1".to_string(), "embedding IS NOT NULL".to_string()];
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> =
        vec![Box::new(user_id.to_string())];
    let mut idx = 2;

    let status = filters.status.unwrap_or(MemoryStatus::Active);
    conditions.push(format!("status = ?{idx}"));
    params_vec.push(Box::new(status.as_str().to_string()));
    idx += 1;

    if let Some(memory_type) = filters.memory_type {
        conditions.push(format!("memory_type = ?{idx}"));
        params_vec.push(Box::new(memory_type.as_str().to_string()));
        idx += 1;
    }
    if let Some(min_importance) = filters.min_importance {
        conditions.push(format!("importance >= ?{idx}"));
        params_vec.push(Box::new(min_importance as i64));
        idx += 1;
    }
    if let Some(ref entity) = filters.entity {
        // JSON containment over the entities array, case-insensitive.
        conditions.push(format!(
            "EXISTS (SELECT 1 FROM json_each(memories.entities)
                     WHERE LOWER(json_each.value) = LOWER(?{idx}))"
        ));
        params_vec.push(Box::new(entity.clone()));
        idx += 1;
    }
    if let Some(date_range) = filters.date_range {
        if let Some(cutoff) = date_range.cutoff(Utc::now()) {
            conditions.push(format!("created_at >= ?{idx}"));
            params_vec.push(Box::new(cutoff.to_rfc3339()));
            idx += 1;
        }
    }
    if let Some(ref domain) = filters.domain {
        conditions.push(format!("domain = ?{idx}"));
        params_vec.push(Box::new(domain.clone()));
        idx += 1;
    }
    if let Some(ref prefix) = filters.category_prefix {
        conditions.push(format!("category LIKE ?{idx}"));
        params_vec.push(Box::new(format!("{prefix}%")));
    }

    let sql = format!(
        "SELECT id, embedding, dimensions FROM memories WHERE {}",
        conditions.join(" AND ")
    );

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let rows = stmt
        .query_map(params_refs.as_slice(), |row| {
            let id: String = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            let dims: i64 = row.get(2)?;
            Ok((id, blob, dims))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let query_len = query_embedding.len();
    let mut scored: Vec<(String, f64)> = Vec::new();
    for row in rows {
        let (id, blob, dims) = row.map_err(|e| to_storage_err(e.to_string()))?;
        if dims as usize != query_len {
            continue;
        }
        let stored = bytes_to_f32_vec(&blob);
        let sim = cosine_similarity(query_embedding, &stored);
        if sim > 0.0 {
            scored.push((id, sim));
        }
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);

    let mut results = Vec::with_capacity(scored.len());
    for (id, sim) in scored {
        if let Some(memory) = memory_crud::get_memory(conn, user_id, parse_uuid(&id)?)? {
            results.push((memory, sim));
        }
    }
    Ok(results)
}

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
