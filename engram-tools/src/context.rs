//! The composition root. Every capability is constructed exactly once
//! here and handed to the engines; there is no global registry.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use uuid::Uuid;

use engram_core::config::EngramConfig;
use engram_core::memory::Memory;
use engram_core::models::MemoryStats;
use engram_core::traits::{IEmbeddingProvider, ILanguageModel, IMemoryStorage};
use engram_core::EngramResult;

use engram_consolidation::ConsolidationEngine;
use engram_embeddings::EmbeddingEngine;
use engram_entities::EntityHubService;
use engram_graph::KnowledgeGraph;
use engram_llm::LlmClient;
use engram_processor::MemoryProcessor;
use engram_recall::RecallEngine;
use engram_session::ShadowListener;
use engram_storage::cache::TtlClass;
use engram_storage::{CacheService, StorageEngine};

use crate::audit::AuditLog;
use crate::rate_limit::RateLimiter;

/// The fully wired system. Dropped (via [`EngramContext::shutdown`]) it
/// stops its background tasks and releases the pool.
pub struct EngramContext {
    pub config: EngramConfig,
    pub storage: Arc<StorageEngine>,
    pub cache: Arc<CacheService>,
    pub embedder: Arc<dyn IEmbeddingProvider>,
    pub llm: Arc<dyn ILanguageModel>,
    pub entities: Arc<EntityHubService>,
    pub graph: Arc<KnowledgeGraph>,
    pub processor: Arc<MemoryProcessor>,
    pub consolidation: Arc<ConsolidationEngine>,
    pub recall: Arc<RecallEngine>,
    pub listener: Arc<ShadowListener>,
    pub audit: AuditLog,
    pub rate_limiter: RateLimiter,
    shutdown_tx: watch::Sender<bool>,
    background_tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl EngramContext {
    /// Build from config with the real remote capabilities. Must run
    /// inside a tokio runtime (background tasks are spawned here).
    pub fn build(config: EngramConfig) -> EngramResult<Self> {
        config.validate()?;
        let storage = match &config.database_path {
            Some(path) => Arc::new(StorageEngine::open(path, config.db_pool_max_size)?),
            None => Arc::new(StorageEngine::open_in_memory()?),
        };
        let embedder: Arc<dyn IEmbeddingProvider> = Arc::new(EmbeddingEngine::new(&config));
        let llm: Arc<dyn ILanguageModel> = Arc::new(LlmClient::new(&config)?);
        Self::assemble(config, storage, embedder, llm)
    }

    /// Build with injected capabilities (tests, embedded use).
    pub fn build_with(
        config: EngramConfig,
        storage: Arc<StorageEngine>,
        embedder: Arc<dyn IEmbeddingProvider>,
        llm: Arc<dyn ILanguageModel>,
    ) -> EngramResult<Self> {
        config.validate()?;
        Self::assemble(config, storage, embedder, llm)
    }

    fn assemble(
        config: EngramConfig,
        storage: Arc<StorageEngine>,
        embedder: Arc<dyn IEmbeddingProvider>,
        llm: Arc<dyn ILanguageModel>,
    ) -> EngramResult<Self> {
        let cache = Arc::new(CacheService::new(
            Duration::from_secs(config.cache_ttl_memories_secs),
            Duration::from_secs(config.cache_ttl_preferences_secs),
        ));
        let graph = Arc::new(KnowledgeGraph::new(storage.clone(), storage.clone()));
        let entities = Arc::new(EntityHubService::new(storage.clone(), llm.clone()));
        let processor = Arc::new(MemoryProcessor::new(
            storage.clone(),
            graph.clone(),
            entities.clone(),
            embedder.clone(),
            llm.clone(),
            cache.clone(),
        ));
        let consolidation = Arc::new(ConsolidationEngine::new(
            processor.clone(),
            graph.clone(),
            entities.clone(),
            embedder.clone(),
            llm.clone(),
            storage.clone(),
            config.consolidation.clone(),
        ));
        let recall = Arc::new(RecallEngine::new(
            storage.clone(),
            storage.clone(),
            storage.clone(),
            embedder.clone(),
            config.recall.clone(),
        ));
        let listener = Arc::new(ShadowListener::new(processor.clone(), llm.clone()));

        let audit = AuditLog::new();
        let rate_limiter = RateLimiter::new(
            config.rate_limit_enabled,
            config.rate_limit_requests_per_minute,
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let background_tasks = vec![
            listener.spawn_sweeper(shutdown_rx.clone()),
            audit.spawn_drain(shutdown_rx),
        ];

        info!(
            dimensions = config.embedding_dimensions,
            llm_provider = config.llm_provider.as_str(),
            "engram context assembled"
        );

        Ok(Self {
            config,
            storage,
            cache,
            embedder,
            llm,
            entities,
            graph,
            processor,
            consolidation,
            recall,
            listener,
            audit,
            rate_limiter,
            shutdown_tx,
            background_tasks,
        })
    }

    /// The user's preference memories, served through the long-TTL cache
    /// namespace. Writes invalidate the namespace, so staleness is
    /// bounded by the write path, not the TTL.
    pub fn user_preferences(&self, user_id: Uuid, limit: usize) -> EngramResult<Vec<Memory>> {
        let key = format!("preferences:{limit}");
        if let Some(cached) = self.cache.get(user_id, TtlClass::Preferences, &key) {
            if let Ok(memories) = serde_json::from_str::<Vec<Memory>>(&cached) {
                return Ok(memories);
            }
        }

        let memories = self.storage.get_preferences(user_id, limit)?;
        if let Ok(serialized) = serde_json::to_string(&memories) {
            self.cache
                .put(user_id, TtlClass::Preferences, &key, serialized);
        }
        Ok(memories)
    }

    /// Aggregate memory statistics, cached in the short-TTL namespace.
    pub fn user_stats(&self, user_id: Uuid) -> EngramResult<MemoryStats> {
        const KEY: &str = "stats";
        if let Some(cached) = self.cache.get(user_id, TtlClass::Memories, KEY) {
            if let Ok(stats) = serde_json::from_str::<MemoryStats>(&cached) {
                return Ok(stats);
            }
        }

        let stats = self.storage.memory_stats(user_id)?;
        if let Ok(serialized) = serde_json::to_string(&stats) {
            self.cache.put(user_id, TtlClass::Memories, KEY, serialized);
        }
        Ok(stats)
    }

    /// Stop background tasks and wait for them to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.background_tasks {
            let _ = task.await;
        }
        info!("engram context shut down");
    }
}

/// Wire tracing with env-filter for binaries and long-running embeddings.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
