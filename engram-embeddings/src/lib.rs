//! # engram-embeddings
//!
//! The embedding capability for the Engram memory system: a remote
//! provider behind a blake3-keyed cache with retry, plus the cosine
//! similarity math used by dedup and recall.

pub mod cache;
pub mod engine;
pub mod providers;
pub mod similarity;

pub use engine::EmbeddingEngine;
pub use similarity::{cosine_similarity, find_duplicate_pairs};
