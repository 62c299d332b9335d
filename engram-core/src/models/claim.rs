use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::graph::EdgeType;
use crate::memory::MemoryType;

/// What kind of statement the language model extracted. Strings cross the
/// boundary only inside the LLM adapter, which validates against this
/// closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Preference,
    Decision,
    Workflow,
    Insight,
    ProjectFact,
    ToolUsage,
    Fact,
    Learning,
    HowTo,
    Struggle,
    Feedback,
}

impl ClaimType {
    /// The fixed claim-type → memory-type table, as an exhaustive match.
    pub fn memory_type(&self) -> MemoryType {
        match self {
            Self::Preference | Self::Decision => MemoryType::Preference,
            Self::Workflow | Self::HowTo => MemoryType::Procedural,
            Self::Insight | Self::ProjectFact | Self::ToolUsage | Self::Fact => {
                MemoryType::Semantic
            }
            Self::Learning => MemoryType::Episodic,
            Self::Struggle | Self::Feedback => MemoryType::Meta,
        }
    }
}

impl FromStr for ClaimType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preference" => Ok(Self::Preference),
            "decision" => Ok(Self::Decision),
            "workflow" => Ok(Self::Workflow),
            "insight" => Ok(Self::Insight),
            "project_fact" => Ok(Self::ProjectFact),
            "tool_usage" => Ok(Self::ToolUsage),
            "fact" => Ok(Self::Fact),
            "learning" => Ok(Self::Learning),
            "how_to" => Ok(Self::HowTo),
            "struggle" => Ok(Self::Struggle),
            "feedback" => Ok(Self::Feedback),
            other => Err(format!("invalid claim type: {other}")),
        }
    }
}

/// A transient statement extracted from a transcript. Becomes a memory
/// after processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub text: String,
    /// Where in the transcript this came from.
    pub source: String,
    pub confidence: f64,
    pub claim_type: ClaimType,
    /// At most five entities.
    pub entities: Vec<String>,
    pub importance: u8,
}

/// Claims grouped as duplicates during consolidation. Indices refer to the
/// extraction-order claim list.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// All member indices, canonical first (lowest transcript position).
    pub members: Vec<usize>,
    pub similarity: f64,
}

impl DuplicateGroup {
    pub fn canonical(&self) -> usize {
        self.members[0]
    }

    /// Duplicates merged away, i.e. members minus the canonical.
    pub fn merged_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }
}

/// Two claims in the conflict band that may contradict each other.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub a: usize,
    pub b: usize,
    pub similarity: f64,
}

/// The language model's judgement on a conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictResolution {
    /// Explanation of how the two statements relate.
    pub resolution: String,
    pub is_real_conflict: bool,
    /// When thinking evolved, the synthesised replacement statement.
    pub evolved: Option<String>,
    pub confidence: f64,
}

/// A relationship hint between two entities, inferred by the language
/// model from finalised claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRelationship {
    pub from_entity: String,
    pub to_entity: String,
    pub edge_type: EdgeType,
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_type_mapping_is_the_fixed_table() {
        assert_eq!(ClaimType::Preference.memory_type(), MemoryType::Preference);
        assert_eq!(ClaimType::Decision.memory_type(), MemoryType::Preference);
        assert_eq!(ClaimType::Workflow.memory_type(), MemoryType::Procedural);
        assert_eq!(ClaimType::HowTo.memory_type(), MemoryType::Procedural);
        assert_eq!(ClaimType::Insight.memory_type(), MemoryType::Semantic);
        assert_eq!(ClaimType::ProjectFact.memory_type(), MemoryType::Semantic);
        assert_eq!(ClaimType::ToolUsage.memory_type(), MemoryType::Semantic);
        assert_eq!(ClaimType::Fact.memory_type(), MemoryType::Semantic);
        assert_eq!(ClaimType::Learning.memory_type(), MemoryType::Episodic);
        assert_eq!(ClaimType::Struggle.memory_type(), MemoryType::Meta);
        assert_eq!(ClaimType::Feedback.memory_type(), MemoryType::Meta);
    }

    #[test]
    fn duplicate_group_counts_merges() {
        let group = DuplicateGroup {
            members: vec![0, 2, 5],
            similarity: 0.9,
        };
        assert_eq!(group.canonical(), 0);
        assert_eq!(group.merged_count(), 2);
    }
}
