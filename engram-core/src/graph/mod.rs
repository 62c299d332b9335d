//! Knowledge-graph edge types.

mod edge;

pub use edge::{EdgeType, KnowledgeEdge, NewEdge};
