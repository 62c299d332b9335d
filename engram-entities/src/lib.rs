//! # engram-entities
//!
//! The Entity Hub subsystem: learned per-user dictionaries, heuristic
//! pattern extraction, an LLM pass for the residue, and the linking of
//! memories to hubs.

pub mod dictionary;
pub mod extractor;
pub mod patterns;
pub mod service;

pub use extractor::EntityExtractor;
pub use service::EntityHubService;
