use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Memory taxonomy following cognitive-science lines.
///
/// - `Episodic`: specific events or conversations
/// - `Semantic`: facts and relationships
/// - `Preference`: what the user likes, dislikes, or chooses
/// - `Procedural`: how-to knowledge
/// - `Meta`: knowledge about the user's own knowledge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Episodic,
    Semantic,
    Preference,
    Procedural,
    Meta,
}

impl MemoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Episodic => "episodic",
            Self::Semantic => "semantic",
            Self::Preference => "preference",
            Self::Procedural => "procedural",
            Self::Meta => "meta",
        }
    }

    /// Default importance for a memory of this type.
    pub fn default_importance(&self) -> u8 {
        match self {
            Self::Preference => 8,
            Self::Procedural | Self::Meta => 7,
            Self::Semantic => 6,
            Self::Episodic => 5,
        }
    }

    pub const ALL: [MemoryType; 5] = [
        Self::Episodic,
        Self::Semantic,
        Self::Preference,
        Self::Procedural,
        Self::Meta,
    ];
}

impl FromStr for MemoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "episodic" => Ok(Self::Episodic),
            "semantic" => Ok(Self::Semantic),
            "preference" => Ok(Self::Preference),
            "procedural" => Ok(Self::Procedural),
            "meta" => Ok(Self::Meta),
            other => Err(format!("invalid memory type: {other}")),
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Memory lifecycle status. Only `Active` memories participate in default
/// recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryStatus {
    Draft,
    Active,
    Archived,
    Superseded,
    Stale,
    Irrelevant,
    Deleted,
}

impl MemoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Superseded => "superseded",
            Self::Stale => "stale",
            Self::Irrelevant => "irrelevant",
            Self::Deleted => "deleted",
        }
    }
}

impl FromStr for MemoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            "superseded" => Ok(Self::Superseded),
            "stale" => Ok(Self::Stale),
            "irrelevant" => Ok(Self::Irrelevant),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!("invalid memory status: {other}")),
        }
    }
}

impl fmt::Display for MemoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a memory originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    Conversation,
    Document,
    Import,
    Manual,
    Consolidation,
}

impl MemorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::Document => "document",
            Self::Import => "import",
            Self::Manual => "manual",
            Self::Consolidation => "consolidation",
        }
    }
}

impl FromStr for MemorySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conversation" => Ok(Self::Conversation),
            "document" => Ok(Self::Document),
            "import" => Ok(Self::Import),
            "manual" => Ok(Self::Manual),
            "consolidation" => Ok(Self::Consolidation),
            other => Err(format!("invalid memory source: {other}")),
        }
    }
}

impl fmt::Display for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
