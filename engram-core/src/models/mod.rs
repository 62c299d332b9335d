//! Shared model structs that cross subsystem boundaries.

mod claim;
mod consolidation;
mod evolution;
mod export;
mod recall;
mod stats;

pub use claim::{Claim, ClaimType, Conflict, ConflictResolution, DuplicateGroup, EntityRelationship};
pub use consolidation::{ConsolidationHistory, ConsolidationResult, ConsolidationStatus};
pub use evolution::{ChangeKind, EvolutionEvent, EvolutionReport};
pub use export::ExportFormat;
pub use recall::{DateRange, RecallFilters, RecallOptions, RecallResult, ScoredMemory};
pub use stats::MemoryStats;
