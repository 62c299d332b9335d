//! RecallEngine — the staged read pipeline with a soft deadline and
//! per-stage degradation.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use engram_core::config::RecallConfig;
use engram_core::constants::RECALL_MAX_LIMIT;
use engram_core::errors::RecallError;
use engram_core::graph::EdgeType;
use engram_core::memory::MemoryStatus;
use engram_core::models::{RecallFilters, RecallOptions, RecallResult, ScoredMemory};
use engram_core::traits::{IEdgeStorage, IEmbeddingProvider, IHubStorage, IMemoryStorage};
use engram_core::{EngramError, EngramResult};

use crate::boost;

/// Graph-enhanced recall. The pipeline never aborts on a failed
/// enhancement stage: evolution filtering, entity expansion, and graph
/// expansion each degrade to the pre-stage candidate set.
pub struct RecallEngine {
    memories: Arc<dyn IMemoryStorage>,
    edges: Arc<dyn IEdgeStorage>,
    hubs: Arc<dyn IHubStorage>,
    embedder: Arc<dyn IEmbeddingProvider>,
    config: RecallConfig,
}

impl RecallEngine {
    pub fn new(
        memories: Arc<dyn IMemoryStorage>,
        edges: Arc<dyn IEdgeStorage>,
        hubs: Arc<dyn IHubStorage>,
        embedder: Arc<dyn IEmbeddingProvider>,
        config: RecallConfig,
    ) -> Self {
        Self {
            memories,
            edges,
            hubs,
            embedder,
            config,
        }
    }

    /// Run the recall pipeline.
    pub async fn recall(
        &self,
        user_id: Uuid,
        query: &str,
        filters: &RecallFilters,
        limit: usize,
        offset: usize,
        options: RecallOptions,
    ) -> EngramResult<RecallResult> {
        if limit > RECALL_MAX_LIMIT {
            return Err(EngramError::Recall(RecallError::LimitTooLarge {
                limit,
                maximum: RECALL_MAX_LIMIT,
            }));
        }
        let limit = if limit == 0 { 10 } else { limit };

        let started = Instant::now();
        let deadline = std::time::Duration::from_millis(self.config.deadline_ms);
        let mut partial = false;

        debug!(
            user_id = %user_id,
            query = %truncated(query, 100),
            respect_evolution = options.respect_evolution,
            expand_entities = options.expand_entities,
            "recall started"
        );

        // Stage 1: query embedding (cached inside the embedding engine).
        let query_embedding = self.embedder.embed(query).await?;

        // Stage 2: primary vector search with over-fetch headroom for the
        // evolution filter.
        let search_limit = if options.respect_evolution {
            (limit * 2).min(RECALL_MAX_LIMIT)
        } else {
            limit
        };
        let primary = self
            .memories
            .search_vector(user_id, &query_embedding, filters, search_limit)?;
        let mut candidates: Vec<ScoredMemory> = primary
            .into_iter()
            .map(|(memory, similarity)| ScoredMemory { memory, similarity })
            .collect();

        // Stage 3: evolution filter.
        let mut evolution_filtered = 0;
        if options.respect_evolution && !candidates.is_empty() && !expired(started, deadline, &mut partial) {
            match self.filter_evolved(user_id, &candidates) {
                Ok(keep) => {
                    evolution_filtered = candidates.len() - keep.len();
                    candidates = keep;
                }
                Err(e) => warn!(error = %e, "evolution filter failed, keeping candidates"),
            }
        }

        // Stage 4: entity expansion tops up short result sets. Seeds come
        // from the residual candidates; an explicit entity filter also
        // seeds, which is what rescues zero-primary-hit queries.
        let mut entity_expanded = 0;
        if options.expand_entities
            && (!candidates.is_empty() || filters.entity.is_some())
            && candidates.len() < limit
            && !expired(started, deadline, &mut partial)
        {
            match self.expand_via_entities(
                user_id,
                &candidates,
                filters.entity.as_deref(),
                limit - candidates.len(),
            ) {
                Ok(extra) => {
                    entity_expanded = extra.len();
                    candidates.extend(extra);
                }
                Err(e) => warn!(error = %e, "entity expansion failed, keeping candidates"),
            }
        }

        // Stage 5: one-hop graph expansion.
        if options.include_related
            && !candidates.is_empty()
            && candidates.len() < limit
            && !expired(started, deadline, &mut partial)
        {
            match self.expand_via_graph(user_id, &candidates, limit - candidates.len()) {
                Ok(extra) => candidates.extend(extra),
                Err(e) => warn!(error = %e, "graph expansion failed, keeping candidates"),
            }
        }

        // Stage 6: boosts and the deterministic ordering.
        if options.apply_recency_boost {
            boost::apply_recency_boost(&mut candidates, Utc::now());
        }
        boost::sort_candidates(&mut candidates);

        // Stage 7: slice.
        let sliced: Vec<ScoredMemory> = candidates.into_iter().skip(offset).take(limit).collect();

        // Stage 8: the acknowledged side effect. Returned memories count
        // as accessed.
        let returned_ids: Vec<Uuid> = sliced.iter().map(|s| s.memory.id).collect();
        if !returned_ids.is_empty() {
            if let Err(e) = self.memories.record_access(user_id, &returned_ids) {
                warn!(error = %e, "failed to record access");
            }
        }

        let total_available = self.memories.count_by_user(user_id, MemoryStatus::Active)?;
        let search_time_ms = started.elapsed().as_millis() as u64;

        info!(
            results = sliced.len(),
            evolution_filtered,
            entity_expanded,
            search_time_ms,
            partial,
            "recall completed"
        );

        Ok(RecallResult {
            query: query.to_string(),
            count: sliced.len(),
            memories: sliced,
            total_available,
            search_time_ms,
            evolution_filtered,
            entity_expanded,
            partial,
        })
    }

    /// Drop candidates with an outgoing evolution edge; their targets are
    /// the up-to-date versions.
    fn filter_evolved(
        &self,
        user_id: Uuid,
        candidates: &[ScoredMemory],
    ) -> EngramResult<Vec<ScoredMemory>> {
        let mut keep = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let evolved = self
                .edges
                .edges_from(user_id, candidate.memory.id, Some(EdgeType::EvolvesInto))?;
            if evolved.is_empty() {
                keep.push(candidate.clone());
            } else {
                debug!(
                    obsolete = %candidate.memory.id,
                    newer = %evolved[0].to_id,
                    "candidate hidden by evolution edge"
                );
            }
        }
        Ok(keep)
    }

    /// Additional active memories sharing entity hubs with the residual
    /// set (or the explicit entity filter), at a synthetic similarity.
    fn expand_via_entities(
        &self,
        user_id: Uuid,
        seeds: &[ScoredMemory],
        filter_entity: Option<&str>,
        max_additional: usize,
    ) -> EngramResult<Vec<ScoredMemory>> {
        let mut entity_names: Vec<String> = Vec::new();
        for seed in seeds {
            for entity in &seed.memory.entities {
                let lower = entity.to_lowercase();
                if !entity_names.contains(&lower) {
                    entity_names.push(lower);
                }
            }
        }
        if let Some(entity) = filter_entity {
            let lower = entity.to_lowercase();
            if !entity_names.contains(&lower) {
                entity_names.push(lower);
            }
        }
        if entity_names.is_empty() {
            return Ok(vec![]);
        }

        let exclude: Vec<Uuid> = seeds.iter().map(|s| s.memory.id).collect();
        let ids = self.hubs.memory_ids_for_entity_names(
            user_id,
            &entity_names,
            &exclude,
            max_additional,
        )?;

        let mut extra = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(memory) = self.memories.get(user_id, id)? {
                extra.push(ScoredMemory {
                    memory,
                    similarity: self.config.entity_expansion_similarity,
                });
            }
        }
        Ok(extra)
    }

    /// One hop of supporting/related/dependency edges from the strongest
    /// residuals.
    fn expand_via_graph(
        &self,
        user_id: Uuid,
        seeds: &[ScoredMemory],
        max_additional: usize,
    ) -> EngramResult<Vec<ScoredMemory>> {
        let seed_ids: Vec<Uuid> = seeds.iter().map(|s| s.memory.id).collect();
        let mut related_ids: Vec<Uuid> = Vec::new();

        'outer: for seed in seeds.iter().take(self.config.graph_expansion_seeds) {
            for edge in self.edges.edges_from(user_id, seed.memory.id, None)? {
                if !matches!(
                    edge.edge_type,
                    EdgeType::RelatedTo | EdgeType::DependsOn | EdgeType::Supports
                ) {
                    continue;
                }
                if seed_ids.contains(&edge.to_id) || related_ids.contains(&edge.to_id) {
                    continue;
                }
                related_ids.push(edge.to_id);
                if related_ids.len() >= max_additional {
                    break 'outer;
                }
            }
        }

        let mut extra = Vec::with_capacity(related_ids.len());
        for id in related_ids {
            if let Some(memory) = self.memories.get(user_id, id)? {
                if memory.status == MemoryStatus::Active {
                    extra.push(ScoredMemory {
                        memory,
                        similarity: self.config.graph_expansion_similarity,
                    });
                }
            }
        }
        Ok(extra)
    }
}

/// Check the soft deadline; flips `partial` the first time it trips.
fn expired(started: Instant, deadline: std::time::Duration, partial: &mut bool) -> bool {
    if started.elapsed() >= deadline {
        if !*partial {
            warn!("recall soft deadline exceeded, returning partial result");
        }
        *partial = true;
        true
    } else {
        false
    }
}

fn truncated(s: &str, max: usize) -> &str {
    let end = s
        .char_indices()
        .nth(max)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..end]
}
