//! # engram-processor
//!
//! The write path of the memory lifecycle: classification fallback,
//! embedding, importance derivation, the nearest-neighbour probe, and the
//! resolution decision (dedup / maturation / conflict / insert).

pub mod classify;
pub mod maturation;
pub mod processor;

pub use processor::MemoryProcessor;
