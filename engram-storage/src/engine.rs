//! StorageEngine — owns the ConnectionPool and implements every storage
//! trait. Startup runs migrations; reads route through the read pool in
//! file-backed mode.

use std::path::Path;

use uuid::Uuid;

use engram_core::entity::{EntityHub, EntitySource, HubType, MemoryEntityLink, NewEntityHub};
use engram_core::errors::EngramResult;
use engram_core::graph::{EdgeType, KnowledgeEdge, NewEdge};
use engram_core::memory::{Memory, MemoryStatus};
use engram_core::models::{ConsolidationHistory, MemoryStats, RecallFilters};
use engram_core::traits::{
    CascadeDeletion, IEdgeStorage, IHistoryStorage, IHubStorage, IMemoryStorage, MemoryListQuery,
};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries;

/// The main storage engine. Owns the connection pool and provides the full
/// storage interface of the system.
pub struct StorageEngine {
    pool: ConnectionPool,
    /// File-backed mode uses the read pool for reads; in-memory mode routes
    /// everything through the writer (in-memory readers are isolated
    /// databases).
    use_read_pool: bool,
}

impl StorageEngine {
    /// Open a storage engine backed by a file on disk.
    pub fn open(path: &Path, read_pool_size: usize) -> EngramResult<Self> {
        let pool = ConnectionPool::open(path, read_pool_size)?;
        let engine = Self {
            pool,
            use_read_pool: true,
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// Open an in-memory storage engine (for testing).
    pub fn open_in_memory() -> EngramResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        let engine = Self {
            pool,
            use_read_pool: false,
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> EngramResult<()> {
        self.pool.writer.with_conn_sync(|conn| {
            migrations::run_migrations(conn)?;
            Ok(())
        })
    }

    /// Get a reference to the connection pool (for advanced operations).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn with_reader<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> EngramResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn_sync(f)
        }
    }
}

impl IMemoryStorage for StorageEngine {
    fn create_with_links(
        &self,
        memory: &Memory,
        links: &[MemoryEntityLink],
    ) -> EngramResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::memory_crud::insert_with_links(conn, memory, links))
    }

    fn create_bulk(&self, memories: &[Memory]) -> EngramResult<usize> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::memory_crud::bulk_insert(conn, memories))
    }

    fn get(&self, user_id: Uuid, id: Uuid) -> EngramResult<Option<Memory>> {
        self.with_reader(|conn| queries::memory_crud::get_memory(conn, user_id, id))
    }

    fn update(&self, memory: &Memory) -> EngramResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::memory_crud::update_memory(conn, memory))
    }

    fn set_status(
        &self,
        user_id: Uuid,
        id: Uuid,
        status: MemoryStatus,
        superseded_by: Option<Uuid>,
    ) -> EngramResult<bool> {
        self.pool.writer.with_conn_sync(|conn| {
            queries::memory_crud::set_status(conn, user_id, id, status, superseded_by)
        })
    }

    fn delete_with_cascade(
        &self,
        user_id: Uuid,
        id: Uuid,
        hard: bool,
    ) -> EngramResult<CascadeDeletion> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::memory_crud::delete_cascade(conn, user_id, id, hard))
    }

    fn reinforce(&self, user_id: Uuid, id: Uuid, confidence_delta: f64) -> EngramResult<()> {
        self.pool.writer.with_conn_sync(|conn| {
            queries::memory_crud::reinforce(conn, user_id, id, confidence_delta)
        })
    }

    fn record_access(&self, user_id: Uuid, ids: &[Uuid]) -> EngramResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::memory_crud::record_access(conn, user_id, ids))
    }

    fn search_vector(
        &self,
        user_id: Uuid,
        embedding: &[f32],
        filters: &RecallFilters,
        limit: usize,
    ) -> EngramResult<Vec<(Memory, f64)>> {
        self.with_reader(|conn| {
            queries::vector_search::search_vector(conn, user_id, embedding, filters, limit)
        })
    }

    fn list_by_user(&self, user_id: Uuid, query: &MemoryListQuery) -> EngramResult<Vec<Memory>> {
        self.with_reader(|conn| queries::memory_query::list_by_user(conn, user_id, query))
    }

    fn count_by_user(&self, user_id: Uuid, status: MemoryStatus) -> EngramResult<u64> {
        self.with_reader(|conn| queries::memory_query::count_by_user(conn, user_id, status))
    }

    fn get_preferences(&self, user_id: Uuid, limit: usize) -> EngramResult<Vec<Memory>> {
        self.with_reader(|conn| queries::memory_query::get_preferences(conn, user_id, limit))
    }

    fn memory_stats(&self, user_id: Uuid) -> EngramResult<MemoryStats> {
        self.with_reader(|conn| queries::memory_query::memory_stats(conn, user_id))
    }

    fn distinct_domains_categories(
        &self,
        user_id: Uuid,
    ) -> EngramResult<(Vec<String>, Vec<String>)> {
        self.with_reader(|conn| queries::memory_query::distinct_domains_categories(conn, user_id))
    }
}

impl IEdgeStorage for StorageEngine {
    fn insert(&self, edge: &NewEdge) -> EngramResult<KnowledgeEdge> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::edge_ops::insert_edge(conn, edge))
    }

    fn upsert(&self, edge: &NewEdge) -> EngramResult<KnowledgeEdge> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::edge_ops::upsert_edge(conn, edge))
    }

    fn edges_from(
        &self,
        user_id: Uuid,
        memory_id: Uuid,
        edge_type: Option<EdgeType>,
    ) -> EngramResult<Vec<KnowledgeEdge>> {
        self.with_reader(|conn| queries::edge_ops::edges_from(conn, user_id, memory_id, edge_type))
    }

    fn edges_to(
        &self,
        user_id: Uuid,
        memory_id: Uuid,
        edge_type: Option<EdgeType>,
    ) -> EngramResult<Vec<KnowledgeEdge>> {
        self.with_reader(|conn| queries::edge_ops::edges_to(conn, user_id, memory_id, edge_type))
    }

    fn all_edges_for(&self, user_id: Uuid, memory_id: Uuid) -> EngramResult<Vec<KnowledgeEdge>> {
        self.with_reader(|conn| queries::edge_ops::all_edges_for(conn, user_id, memory_id))
    }

    fn all_for_user(&self, user_id: Uuid) -> EngramResult<Vec<KnowledgeEdge>> {
        self.with_reader(|conn| queries::edge_ops::all_for_user(conn, user_id))
    }

    fn delete_for_memory(&self, user_id: Uuid, memory_id: Uuid) -> EngramResult<u64> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::edge_ops::delete_for_memory(conn, user_id, memory_id))
    }
}

impl IHubStorage for StorageEngine {
    fn get_by_id(&self, user_id: Uuid, id: Uuid) -> EngramResult<Option<EntityHub>> {
        self.with_reader(|conn| queries::hub_ops::get_by_id(conn, user_id, id))
    }

    fn get_by_name(&self, user_id: Uuid, entity_name: &str) -> EngramResult<Option<EntityHub>> {
        self.with_reader(|conn| queries::hub_ops::get_by_name(conn, user_id, entity_name))
    }

    fn create(&self, hub: &NewEntityHub) -> EngramResult<EntityHub> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::hub_ops::insert_hub(conn, hub))
    }

    fn get_or_create(
        &self,
        user_id: Uuid,
        entity_name: &str,
        hub_type: HubType,
        category: Option<&str>,
        source: EntitySource,
        confidence: f64,
    ) -> EngramResult<(EntityHub, bool)> {
        self.pool.writer.with_conn_sync(|conn| {
            queries::hub_ops::get_or_create(
                conn,
                user_id,
                entity_name,
                hub_type,
                category,
                source,
                confidence,
            )
        })
    }

    fn touch_usage(&self, user_id: Uuid, hub_id: Uuid) -> EngramResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::hub_ops::touch_usage(conn, user_id, hub_id))
    }

    fn top_by_usage(
        &self,
        user_id: Uuid,
        limit: usize,
        hub_type: Option<HubType>,
    ) -> EngramResult<Vec<EntityHub>> {
        self.with_reader(|conn| queries::hub_ops::top_by_usage(conn, user_id, limit, hub_type))
    }

    fn search(&self, user_id: Uuid, query: &str) -> EngramResult<Vec<EntityHub>> {
        self.with_reader(|conn| queries::hub_ops::search(conn, user_id, query))
    }

    fn upsert_link(&self, link: &MemoryEntityLink) -> EngramResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::link_ops::upsert_link(conn, link))
    }

    fn links_for_memory(
        &self,
        user_id: Uuid,
        memory_id: Uuid,
    ) -> EngramResult<Vec<MemoryEntityLink>> {
        self.with_reader(|conn| queries::link_ops::links_for_memory(conn, user_id, memory_id))
    }

    fn delete_links_for_memory(&self, user_id: Uuid, memory_id: Uuid) -> EngramResult<u64> {
        self.pool.writer.with_conn_sync(|conn| {
            queries::link_ops::delete_links_for_memory(conn, user_id, memory_id)
        })
    }

    fn memory_ids_for_entity_names(
        &self,
        user_id: Uuid,
        entity_names: &[String],
        exclude: &[Uuid],
        limit: usize,
    ) -> EngramResult<Vec<Uuid>> {
        self.with_reader(|conn| {
            queries::link_ops::memory_ids_for_entity_names(
                conn,
                user_id,
                entity_names,
                exclude,
                limit,
            )
        })
    }
}

impl IHistoryStorage for StorageEngine {
    fn insert(&self, history: &ConsolidationHistory) -> EngramResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| queries::history_ops::insert(conn, history))
    }

    fn get(&self, user_id: Uuid, id: Uuid) -> EngramResult<Option<ConsolidationHistory>> {
        self.with_reader(|conn| queries::history_ops::get(conn, user_id, id))
    }
}
