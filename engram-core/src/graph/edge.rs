use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Typed, directed relationship between two memories of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    LeadsTo,
    RelatedTo,
    Contradicts,
    Supports,
    Likes,
    Dislikes,
    DependsOn,
    /// The target memory is the up-to-date replacement for the source.
    /// Recall hides sources of such edges unless explicitly asked.
    EvolvesInto,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeadsTo => "leads_to",
            Self::RelatedTo => "related_to",
            Self::Contradicts => "contradicts",
            Self::Supports => "supports",
            Self::Likes => "likes",
            Self::Dislikes => "dislikes",
            Self::DependsOn => "depends_on",
            Self::EvolvesInto => "evolves_into",
        }
    }

    /// Whether this edge type carries causal meaning by itself.
    pub fn is_causal(&self) -> bool {
        matches!(self, Self::LeadsTo | Self::EvolvesInto | Self::DependsOn)
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leads_to" => Ok(Self::LeadsTo),
            "related_to" => Ok(Self::RelatedTo),
            "contradicts" => Ok(Self::Contradicts),
            "supports" => Ok(Self::Supports),
            "likes" => Ok(Self::Likes),
            "dislikes" => Ok(Self::Dislikes),
            "depends_on" => Ok(Self::DependsOn),
            "evolves_into" => Ok(Self::EvolvesInto),
            other => Err(format!("invalid edge type: {other}")),
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored knowledge-graph edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEdge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub from_id: Uuid,
    pub to_id: Uuid,
    pub edge_type: EdgeType,
    /// Relationship strength in 0.0..=1.0.
    pub strength: f64,
    /// Confidence in 0.0..=1.0. Never decreases on upsert.
    pub confidence: f64,
    pub causality: bool,
    /// Query-expansion hint only; no reverse row is materialised.
    pub bidirectional: bool,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeEdge {
    pub fn is_strong(&self, threshold: f64) -> bool {
        self.strength >= threshold
    }
}

/// Payload for creating an edge. Self-edges are rejected at the graph layer.
#[derive(Debug, Clone)]
pub struct NewEdge {
    pub user_id: Uuid,
    pub from_id: Uuid,
    pub to_id: Uuid,
    pub edge_type: EdgeType,
    pub strength: f64,
    pub confidence: f64,
    pub causality: bool,
    pub bidirectional: bool,
    pub reason: Option<String>,
}

impl NewEdge {
    pub fn new(user_id: Uuid, from_id: Uuid, to_id: Uuid, edge_type: EdgeType) -> Self {
        Self {
            user_id,
            from_id,
            to_id,
            edge_type,
            strength: 0.7,
            confidence: 0.8,
            causality: edge_type.is_causal(),
            bidirectional: false,
            reason: None,
        }
    }

    pub fn is_self_edge(&self) -> bool {
        self.from_id == self.to_id
    }
}
