use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// What kind of thing an entity hub names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubType {
    Person,
    Place,
    Event,
    Recipe,
    Concept,
    Tech,
    Project,
    Organization,
}

impl HubType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Place => "place",
            Self::Event => "event",
            Self::Recipe => "recipe",
            Self::Concept => "concept",
            Self::Tech => "tech",
            Self::Project => "project",
            Self::Organization => "organization",
        }
    }
}

impl FromStr for HubType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "person" => Ok(Self::Person),
            "place" => Ok(Self::Place),
            "event" => Ok(Self::Event),
            "recipe" => Ok(Self::Recipe),
            "concept" => Ok(Self::Concept),
            "tech" => Ok(Self::Tech),
            "project" => Ok(Self::Project),
            "organization" => Ok(Self::Organization),
            other => Err(format!("invalid hub type: {other}")),
        }
    }
}

impl fmt::Display for HubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a hub was learned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitySource {
    Llm,
    UserDefined,
    System,
    Imported,
}

impl EntitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::UserDefined => "user_defined",
            Self::System => "system",
            Self::Imported => "imported",
        }
    }
}

impl FromStr for EntitySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "llm" => Ok(Self::Llm),
            "user_defined" => Ok(Self::UserDefined),
            "system" => Ok(Self::System),
            "imported" => Ok(Self::Imported),
            other => Err(format!("invalid entity source: {other}")),
        }
    }
}

/// A per-user learned index node. Hubs persist even when every referencing
/// memory is gone; their counters go to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityHub {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Normalised lowercase key. Unique per user.
    pub entity_name: String,
    /// Original casing for display.
    pub display_name: Option<String>,
    /// User-defined label (e.g. "Sarah (from work)").
    pub canonical_name: Option<String>,
    pub category: Option<String>,
    pub hub_type: HubType,
    /// Alternative names for matching.
    pub aliases: Vec<String>,
    pub confidence: f64,
    pub usage_count: u64,
    pub memory_count: u64,
    pub last_used: DateTime<Utc>,
    pub source: EntitySource,
    #[serde(skip_serializing, default)]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityHub {
    /// All names this hub answers to, lowercased.
    pub fn match_keys(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.entity_name.to_lowercase())
            .chain(self.aliases.iter().map(|a| a.to_lowercase()))
    }
}

/// Payload for creating a hub. `entity_name` is normalised by the store.
#[derive(Debug, Clone)]
pub struct NewEntityHub {
    pub user_id: Uuid,
    pub entity_name: String,
    pub display_name: Option<String>,
    pub canonical_name: Option<String>,
    pub category: Option<String>,
    pub hub_type: HubType,
    pub aliases: Vec<String>,
    pub confidence: f64,
    pub source: EntitySource,
    pub embedding: Option<Vec<f32>>,
}

impl NewEntityHub {
    pub fn named(user_id: Uuid, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            user_id,
            entity_name: name.to_lowercase(),
            display_name: Some(name),
            canonical_name: None,
            category: None,
            hub_type: HubType::Concept,
            aliases: Vec::new(),
            confidence: 0.8,
            source: EntitySource::Llm,
            embedding: None,
        }
    }
}

/// Many-to-many join between memories and hubs. Unique on
/// `(memory_id, entity_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntityLink {
    pub memory_id: Uuid,
    pub entity_id: Uuid,
    pub user_id: Uuid,
    pub strength: f64,
    pub is_primary: bool,
    pub mention_count: u64,
    pub context_snippet: Option<String>,
}

/// Which extraction tier surfaced an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    Dictionary,
    Heuristic,
    Llm,
}

/// One entity surfaced by extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    pub tier: ExtractionTier,
}

/// The result of running extraction over a text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub entities: Vec<ExtractedEntity>,
    pub from_dictionary: usize,
    pub from_llm: usize,
}

impl ExtractionResult {
    pub fn names(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.name.clone()).collect()
    }
}
