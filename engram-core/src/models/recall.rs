use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::memory::{Memory, MemoryStatus, MemoryType};

/// Closed set of time filters on recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Last7Days,
    Last30Days,
    LastYear,
    AllTime,
}

impl DateRange {
    /// Lower bound for `created_at`, or `None` for all time.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Last7Days => Some(now - Duration::days(7)),
            Self::Last30Days => Some(now - Duration::days(30)),
            Self::LastYear => Some(now - Duration::days(365)),
            Self::AllTime => None,
        }
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last_7_days" => Ok(Self::Last7Days),
            "last_30_days" => Ok(Self::Last30Days),
            "last_year" => Ok(Self::LastYear),
            "all_time" => Ok(Self::AllTime),
            other => Err(format!("invalid date range: {other}")),
        }
    }
}

/// Filters honoured at the SQL layer during the primary vector search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecallFilters {
    pub memory_type: Option<MemoryType>,
    pub min_importance: Option<u8>,
    /// JSON containment on the entities column.
    pub entity: Option<String>,
    pub date_range: Option<DateRange>,
    pub domain: Option<String>,
    /// Prefix match on the slash-separated category path.
    pub category_prefix: Option<String>,
    /// Defaults to `Active` when unset.
    pub status: Option<MemoryStatus>,
}

/// Per-call behaviour switches for the recall pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecallOptions {
    /// Hide memories with an outgoing evolution edge.
    pub respect_evolution: bool,
    /// Top up short result sets via entity hubs.
    pub expand_entities: bool,
    /// Walk one hop of supporting/related/dependency edges.
    pub include_related: bool,
    /// Boost recently and frequently accessed memories.
    pub apply_recency_boost: bool,
}

impl Default for RecallOptions {
    fn default() -> Self {
        Self {
            respect_evolution: true,
            expand_entities: true,
            include_related: false,
            apply_recency_boost: true,
        }
    }
}

/// A memory with its (possibly boosted or synthetic) similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMemory {
    pub memory: Memory,
    pub similarity: f64,
}

impl ScoredMemory {
    pub fn id(&self) -> Uuid {
        self.memory.id
    }
}

/// What a recall call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallResult {
    pub query: String,
    pub memories: Vec<ScoredMemory>,
    pub count: usize,
    /// Active memories the user has in total.
    pub total_available: u64,
    pub search_time_ms: u64,
    pub evolution_filtered: usize,
    pub entity_expanded: usize,
    /// True when the soft deadline cut the pipeline short.
    pub partial: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_cutoffs() {
        let now = Utc::now();
        assert_eq!(DateRange::AllTime.cutoff(now), None);
        let week = DateRange::Last7Days.cutoff(now).unwrap();
        assert_eq!((now - week).num_days(), 7);
    }

    #[test]
    fn default_options_match_contract() {
        let opts = RecallOptions::default();
        assert!(opts.respect_evolution);
        assert!(opts.expand_entities);
        assert!(!opts.include_related);
        assert!(opts.apply_recency_boost);
    }
}
