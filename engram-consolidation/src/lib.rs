//! # engram-consolidation
//!
//! The batched write path: one transcript in, a coherent set of memories,
//! edges, and an audit row out.

pub mod conflicts;
pub mod dedup;
pub mod engine;

pub use engine::ConsolidationEngine;
