//! MemoryProcessor — the ordered write pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use engram_core::constants::{
    NN_PROBE_TOP_K, WRITE_CONFLICT_THRESHOLD, WRITE_DEDUP_THRESHOLD, WRITE_MERGE_THRESHOLD,
};
use engram_core::memory::{Memory, MemorySource, MemoryStatus, MemoryType, NewMemory, WriteOutcome};
use engram_core::models::RecallFilters;
use engram_core::traits::{
    CascadeDeletion, Classification, IEmbeddingProvider, ILanguageModel, IMemoryStorage,
};
use engram_core::validate;
use engram_core::{EngramError, EngramResult};
use engram_entities::EntityHubService;
use engram_graph::KnowledgeGraph;
use engram_storage::CacheService;

use crate::classify;
use crate::maturation;

/// Processor for creating and resolving memories. Safe to call
/// concurrently for the same user: per-memory writes serialise on the
/// database row, and hub creation is race-safe.
pub struct MemoryProcessor {
    memories: Arc<dyn IMemoryStorage>,
    graph: Arc<KnowledgeGraph>,
    entities: Arc<EntityHubService>,
    embedder: Arc<dyn IEmbeddingProvider>,
    llm: Arc<dyn ILanguageModel>,
    cache: Arc<CacheService>,
    /// Serialises the probe→resolve→insert window per user, so two
    /// concurrent identical writes can never both pass the probe.
    write_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl MemoryProcessor {
    pub fn new(
        memories: Arc<dyn IMemoryStorage>,
        graph: Arc<KnowledgeGraph>,
        entities: Arc<EntityHubService>,
        embedder: Arc<dyn IEmbeddingProvider>,
        llm: Arc<dyn ILanguageModel>,
        cache: Arc<CacheService>,
    ) -> Self {
        Self {
            memories,
            graph,
            entities,
            embedder,
            llm,
            cache,
            write_locks: DashMap::new(),
        }
    }

    /// Run the full write pipeline for one memory.
    pub async fn process_memory(
        &self,
        user_id: Uuid,
        new: NewMemory,
    ) -> EngramResult<(Memory, WriteOutcome)> {
        validate::content(&new.content)?;
        if let Some(importance) = new.importance {
            validate::importance(importance)?;
        }
        if let Some(confidence) = new.confidence {
            validate::unit_interval("confidence", confidence)?;
        }

        debug!(
            user_id = %user_id,
            content_length = new.content.len(),
            "processing memory"
        );

        let lock = self
            .write_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _write_guard = lock.lock().await;

        // Step 1: classification fallback.
        let mut memory_type = new.memory_type;
        let mut domain = new.domain.clone();
        let mut category = new.category.clone();
        if memory_type.is_none() || domain.is_none() || category.is_none() {
            let classification = self.classify_with_fallback(user_id, &new.content).await;
            memory_type = memory_type.or(classification.memory_type);
            domain = domain.or(classification.domain);
            category = category.or(classification.category);
        }
        let memory_type =
            memory_type.unwrap_or_else(|| classify::infer_memory_type(&new.content));

        // Step 2: embedding (cached by content hash inside the engine).
        let embedding = match new.embedding.clone() {
            Some(embedding) => embedding,
            None => self.embedder.embed(&new.content).await?,
        };

        // Entity linkage input: caller-provided names, or a fresh
        // extract-and-learn pass.
        let entity_names = if new.entities.is_empty() {
            self.entities
                .extract_and_learn(user_id, &new.content)
                .await?
                .names()
        } else {
            new.entities.clone()
        };

        // Step 3: importance derivation.
        let importance = new
            .importance
            .unwrap_or_else(|| derive_importance(&new.content, memory_type, &entity_names));
        let confidence = new.confidence.unwrap_or(0.8);
        let status = new.status.unwrap_or(MemoryStatus::Active);

        // Step 4: nearest-neighbour probe over active memories and drafts,
        // respecting (domain, category) when known.
        let neighbours = self.probe(user_id, &embedding, domain.as_deref(), category.as_deref())?;

        // Step 5: resolution decision on the top hit.
        if let Some((top, similarity)) = neighbours.first() {
            let similarity = *similarity;
            if similarity >= WRITE_DEDUP_THRESHOLD {
                self.memories.reinforce(user_id, top.id, 0.1)?;
                self.cache.invalidate_user(user_id);
                let updated = self
                    .memories
                    .get(user_id, top.id)?
                    .ok_or_else(|| EngramError::internal("deduplicated memory vanished"))?;
                info!(memory_id = %updated.id, similarity, "write deduplicated into existing memory");
                return Ok((updated, WriteOutcome::Deduplicated));
            }

            if similarity >= WRITE_MERGE_THRESHOLD {
                return self.merge_into(user_id, top.clone(), confidence, &new.metadata);
            }

            if similarity >= WRITE_CONFLICT_THRESHOLD && top.memory_type == memory_type {
                match self.llm.check_contradiction(&new.content, &top.content).await {
                    Ok(true) => {
                        return self
                            .resolve_conflict_write(
                                user_id,
                                top,
                                &new,
                                memory_type,
                                domain,
                                category,
                                importance,
                                confidence,
                                embedding,
                                entity_names,
                            )
                            .await;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!(error = %e, "contradiction check failed, falling through to insert");
                    }
                }
            }
        }

        // Step 6/7: plain insert with entity linkage, one transaction.
        let memory = self.build_memory(
            user_id,
            &new,
            memory_type,
            status,
            domain,
            category,
            importance,
            confidence,
            embedding,
            entity_names,
        );
        let links = self.entities.build_links(&memory, &memory.entities)?;
        self.memories.create_with_links(&memory, &links)?;
        self.cache.invalidate_user(user_id);

        info!(
            memory_id = %memory.id,
            memory_type = %memory.memory_type,
            importance = memory.importance,
            "memory created"
        );
        Ok((memory, WriteOutcome::Created))
    }

    /// Process a batch, reusing already-computed embeddings and filling
    /// the rest in one round-trip. Each item still runs the full pipeline.
    pub async fn process_batch(
        &self,
        user_id: Uuid,
        mut batch: Vec<NewMemory>,
    ) -> EngramResult<Vec<(Memory, WriteOutcome)>> {
        if batch.is_empty() {
            return Ok(vec![]);
        }

        let missing: Vec<usize> = batch
            .iter()
            .enumerate()
            .filter(|(_, m)| m.embedding.is_none())
            .map(|(i, _)| i)
            .collect();
        if !missing.is_empty() {
            let texts: Vec<String> = missing.iter().map(|&i| batch[i].content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            for (&index, embedding) in missing.iter().zip(embeddings) {
                batch[index].embedding = Some(embedding);
            }
        }

        let mut results = Vec::with_capacity(batch.len());
        for new in batch {
            results.push(self.process_memory(user_id, new).await?);
        }

        info!(user_id = %user_id, count = results.len(), "batch processing completed");
        Ok(results)
    }

    /// Delete a memory with edge/link cascade. Soft unless `hard`.
    pub fn delete_memory(
        &self,
        user_id: Uuid,
        memory_id: Uuid,
        hard: bool,
    ) -> EngramResult<CascadeDeletion> {
        let cascade = self.memories.delete_with_cascade(user_id, memory_id, hard)?;
        self.cache.invalidate_user(user_id);
        info!(
            memory_id = %memory_id,
            hard,
            edges_removed = cascade.edges_removed,
            "memory deleted"
        );
        Ok(cascade)
    }

    async fn classify_with_fallback(&self, user_id: Uuid, content: &str) -> Classification {
        let (domains, categories) = self
            .memories
            .distinct_domains_categories(user_id)
            .unwrap_or_default();

        match self
            .llm
            .classify_content(content, &domains, &categories)
            .await
        {
            Ok(classification) => classify::coerce_domain(classification),
            Err(e) => {
                warn!(error = %e, "classification failed after retries, using fallback taxonomy");
                classify::fallback_classification()
            }
        }
    }

    /// Probe active memories and drafts; the strongest hit across both
    /// decides the resolution.
    fn probe(
        &self,
        user_id: Uuid,
        embedding: &[f32],
        domain: Option<&str>,
        category: Option<&str>,
    ) -> EngramResult<Vec<(Memory, f64)>> {
        let filters = RecallFilters {
            domain: domain.map(str::to_string),
            category_prefix: category.map(str::to_string),
            ..RecallFilters::default()
        };
        let mut hits = self
            .memories
            .search_vector(user_id, embedding, &filters, NN_PROBE_TOP_K)?;

        let draft_filters = RecallFilters {
            status: Some(MemoryStatus::Draft),
            ..filters
        };
        hits.extend(self.memories.search_vector(
            user_id,
            embedding,
            &draft_filters,
            NN_PROBE_TOP_K,
        )?);

        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(NN_PROBE_TOP_K);
        Ok(hits)
    }

    /// The 0.85..0.95 band: merge evidence into the existing memory, and
    /// ripen drafts per the maturation rule.
    fn merge_into(
        &self,
        user_id: Uuid,
        mut existing: Memory,
        new_confidence: f64,
        new_metadata: &BTreeMap<String, String>,
    ) -> EngramResult<(Memory, WriteOutcome)> {
        for (key, value) in new_metadata {
            existing.metadata.entry(key.clone()).or_insert(value.clone());
        }
        existing.last_accessed = Some(Utc::now());
        existing.access_count += 1;

        let outcome = if existing.status == MemoryStatus::Draft {
            if maturation::apply_evidence(&mut existing, new_confidence) {
                existing.status = MemoryStatus::Active;
                info!(memory_id = %existing.id, "draft matured to active");
                WriteOutcome::Matured
            } else {
                WriteOutcome::Consolidated
            }
        } else {
            WriteOutcome::Consolidated
        };

        self.memories.update(&existing)?;
        self.cache.invalidate_user(user_id);
        Ok((existing, outcome))
    }

    /// The conflict band: the new memory wins, the old one is superseded
    /// with an evolution edge recording the lineage.
    #[allow(clippy::too_many_arguments)]
    async fn resolve_conflict_write(
        &self,
        user_id: Uuid,
        superseded: &Memory,
        new: &NewMemory,
        memory_type: MemoryType,
        domain: Option<String>,
        category: Option<String>,
        importance: u8,
        confidence: f64,
        embedding: Vec<f32>,
        entity_names: Vec<String>,
    ) -> EngramResult<(Memory, WriteOutcome)> {
        let memory = self.build_memory(
            user_id,
            new,
            memory_type,
            MemoryStatus::Active,
            domain,
            category,
            importance,
            confidence,
            embedding,
            entity_names,
        );
        let links = self.entities.build_links(&memory, &memory.entities)?;
        self.memories.create_with_links(&memory, &links)?;

        self.graph.mark_superseded(
            user_id,
            superseded.id,
            memory.id,
            Some("Contradicted by newer statement"),
        )?;
        self.cache.invalidate_user(user_id);

        info!(
            old = %superseded.id,
            new = %memory.id,
            "conflicting memory superseded"
        );
        Ok((memory, WriteOutcome::ConflictResolved))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_memory(
        &self,
        user_id: Uuid,
        new: &NewMemory,
        memory_type: MemoryType,
        status: MemoryStatus,
        domain: Option<String>,
        category: Option<String>,
        importance: u8,
        confidence: f64,
        embedding: Vec<f32>,
        entity_names: Vec<String>,
    ) -> Memory {
        let now = Utc::now();
        let mut memory = Memory {
            id: Uuid::new_v4(),
            user_id,
            content: new.content.clone(),
            memory_type,
            status,
            embedding: Some(embedding),
            entities: entity_names,
            domain,
            category,
            importance,
            confidence,
            source: new.source.unwrap_or(MemorySource::Conversation),
            source_id: new.source_id.clone(),
            metadata: new.metadata.clone(),
            superseded_by: None,
            access_count: 0,
            last_accessed: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            content_hash: Memory::hash_content(&new.content),
        };
        if status == MemoryStatus::Draft {
            maturation::seed(&mut memory);
        }
        memory
    }
}

/// Importance derivation: type default, adjusted for content length and
/// entity richness, clamped into 1..=10.
pub fn derive_importance(content: &str, memory_type: MemoryType, entities: &[String]) -> u8 {
    let mut base = memory_type.default_importance() as i32;

    let length = content.chars().count();
    if length >= 500 {
        base += 1;
    } else if length < 50 {
        base -= 1;
    }

    if entities.len() >= 5 {
        base += 2;
    } else if entities.len() >= 3 {
        base += 1;
    }

    validate::clamp_importance(base)
}
