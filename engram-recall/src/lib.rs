//! # engram-recall
//!
//! The read path: primary vector search, evolution-aware filtering,
//! entity and graph expansion, recency boosting, and the side-effectful
//! access update.

pub mod boost;
pub mod engine;

pub use engine::RecallEngine;
