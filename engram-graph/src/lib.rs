//! # engram-graph
//!
//! The knowledge graph: a typed, directed edge store over memories with
//! bounded traversal, path finding, contradiction lookup, and evolution
//! semantics.

pub mod engine;
pub mod traversal;

pub use engine::KnowledgeGraph;
pub use traversal::{IndexedGraph, TraversalNode};
