use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entity::{EntityHub, EntitySource, HubType, MemoryEntityLink, NewEntityHub};
use crate::errors::EngramResult;
use crate::graph::{EdgeType, KnowledgeEdge, NewEdge};
use crate::memory::{Memory, MemoryStatus, MemoryType};
use crate::models::{ConsolidationHistory, MemoryStats, RecallFilters};

/// Paged listing query. `status: None` means every non-deleted,
/// non-superseded memory.
#[derive(Debug, Clone)]
pub struct MemoryListQuery {
    pub limit: usize,
    pub offset: usize,
    pub memory_type: Option<MemoryType>,
    pub status: Option<MemoryStatus>,
}

impl Default for MemoryListQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
            memory_type: None,
            status: Some(MemoryStatus::Active),
        }
    }
}

/// What a cascade deletion removed alongside the memory row.
#[derive(Debug, Clone)]
pub struct CascadeDeletion {
    /// Set for soft deletes; `None` when the row was removed outright.
    pub deleted_at: Option<DateTime<Utc>>,
    pub edges_removed: u64,
    pub links_removed: u64,
}

/// Memory persistence. Every operation is predicated on `user_id`; rows of
/// other users are invisible.
pub trait IMemoryStorage: Send + Sync {
    /// Insert the memory and its entity links in one transaction.
    fn create_with_links(
        &self,
        memory: &Memory,
        links: &[MemoryEntityLink],
    ) -> EngramResult<()>;
    fn create_bulk(&self, memories: &[Memory]) -> EngramResult<usize>;

    /// Fetch a memory regardless of status, excluding hard-deleted rows.
    fn get(&self, user_id: Uuid, id: Uuid) -> EngramResult<Option<Memory>>;
    /// Full-row update. Errors with `NotFound` when the row is missing.
    fn update(&self, memory: &Memory) -> EngramResult<()>;

    /// Status transition in one statement. `superseded_by` is written (or
    /// cleared) alongside; `deleted_at` is maintained for `Deleted`.
    fn set_status(
        &self,
        user_id: Uuid,
        id: Uuid,
        status: MemoryStatus,
        superseded_by: Option<Uuid>,
    ) -> EngramResult<bool>;

    /// Delete a memory and cascade to its edges and entity links in one
    /// transaction. Soft by default; `hard` removes the row outright.
    /// Errors with `NotFound` when the memory is missing or deleted.
    fn delete_with_cascade(
        &self,
        user_id: Uuid,
        id: Uuid,
        hard: bool,
    ) -> EngramResult<CascadeDeletion>;

    /// Dedup reinforcement: `access_count` + 1, confidence raised by
    /// `confidence_delta` capped at 1.0, `last_accessed` refreshed.
    fn reinforce(&self, user_id: Uuid, id: Uuid, confidence_delta: f64) -> EngramResult<()>;

    /// Increment access counters for memories a recall returned.
    fn record_access(&self, user_id: Uuid, ids: &[Uuid]) -> EngramResult<()>;

    /// Cosine similarity scan over the user's memories, honouring the
    /// filters at the SQL layer. Results ordered by similarity descending.
    fn search_vector(
        &self,
        user_id: Uuid,
        embedding: &[f32],
        filters: &RecallFilters,
        limit: usize,
    ) -> EngramResult<Vec<(Memory, f64)>>;

    fn list_by_user(&self, user_id: Uuid, query: &MemoryListQuery) -> EngramResult<Vec<Memory>>;
    fn count_by_user(&self, user_id: Uuid, status: MemoryStatus) -> EngramResult<u64>;

    /// Preference memories, importance-desc then created-desc.
    fn get_preferences(&self, user_id: Uuid, limit: usize) -> EngramResult<Vec<Memory>>;
    fn memory_stats(&self, user_id: Uuid) -> EngramResult<MemoryStats>;
    /// Distinct active domains and categories, for classification context.
    fn distinct_domains_categories(
        &self,
        user_id: Uuid,
    ) -> EngramResult<(Vec<String>, Vec<String>)>;
}

/// Knowledge-edge persistence.
pub trait IEdgeStorage: Send + Sync {
    /// Insert a new edge. A `(user, from, to, type)` collision is a
    /// `Conflict` error.
    fn insert(&self, edge: &NewEdge) -> EngramResult<KnowledgeEdge>;

    /// Insert-or-update: strength is replaced, confidence takes the max of
    /// stored and incoming.
    fn upsert(&self, edge: &NewEdge) -> EngramResult<KnowledgeEdge>;

    fn edges_from(
        &self,
        user_id: Uuid,
        memory_id: Uuid,
        edge_type: Option<EdgeType>,
    ) -> EngramResult<Vec<KnowledgeEdge>>;
    fn edges_to(
        &self,
        user_id: Uuid,
        memory_id: Uuid,
        edge_type: Option<EdgeType>,
    ) -> EngramResult<Vec<KnowledgeEdge>>;
    fn all_edges_for(&self, user_id: Uuid, memory_id: Uuid) -> EngramResult<Vec<KnowledgeEdge>>;

    /// Every edge the user owns, for building traversal graphs.
    fn all_for_user(&self, user_id: Uuid) -> EngramResult<Vec<KnowledgeEdge>>;

    /// Cascade helper. Returns how many edges were removed.
    fn delete_for_memory(&self, user_id: Uuid, memory_id: Uuid) -> EngramResult<u64>;
}

/// Entity-hub and memory-entity-link persistence.
pub trait IHubStorage: Send + Sync {
    fn get_by_id(&self, user_id: Uuid, id: Uuid) -> EngramResult<Option<EntityHub>>;
    fn get_by_name(&self, user_id: Uuid, entity_name: &str) -> EngramResult<Option<EntityHub>>;
    fn create(&self, hub: &NewEntityHub) -> EngramResult<EntityHub>;

    /// Race-safe fetch-or-insert keyed on `(user_id, entity_name)`; relies
    /// on the unique constraint with a re-fetch on conflict.
    fn get_or_create(
        &self,
        user_id: Uuid,
        entity_name: &str,
        hub_type: HubType,
        category: Option<&str>,
        source: EntitySource,
        confidence: f64,
    ) -> EngramResult<(EntityHub, bool)>;

    /// `usage_count` + 1, `last_used` refreshed.
    fn touch_usage(&self, user_id: Uuid, hub_id: Uuid) -> EngramResult<()>;

    fn top_by_usage(
        &self,
        user_id: Uuid,
        limit: usize,
        hub_type: Option<HubType>,
    ) -> EngramResult<Vec<EntityHub>>;
    fn search(&self, user_id: Uuid, query: &str) -> EngramResult<Vec<EntityHub>>;

    /// Link upsert: on `(memory_id, entity_id)` conflict keep the greater
    /// strength and increment `mention_count`.
    fn upsert_link(&self, link: &MemoryEntityLink) -> EngramResult<()>;
    fn links_for_memory(
        &self,
        user_id: Uuid,
        memory_id: Uuid,
    ) -> EngramResult<Vec<MemoryEntityLink>>;
    /// Cascade helper for deletions. Returns removed link count.
    fn delete_links_for_memory(&self, user_id: Uuid, memory_id: Uuid) -> EngramResult<u64>;

    /// Active memory ids linked to any of the named hubs, excluding the
    /// given ids. Feeds recall's entity expansion.
    fn memory_ids_for_entity_names(
        &self,
        user_id: Uuid,
        entity_names: &[String],
        exclude: &[Uuid],
        limit: usize,
    ) -> EngramResult<Vec<Uuid>>;
}

/// Consolidation audit-row persistence.
pub trait IHistoryStorage: Send + Sync {
    fn insert(&self, history: &ConsolidationHistory) -> EngramResult<()>;
    fn get(&self, user_id: Uuid, id: Uuid) -> EngramResult<Option<ConsolidationHistory>>;
}
