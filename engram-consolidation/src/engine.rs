//! ConsolidationEngine — the ten-step transcript pipeline.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use engram_core::config::ConsolidationConfig;
use engram_core::constants::{
    CONSOLIDATION_BATCH_SIZE, MAX_TRANSCRIPT_LENGTH, MIN_TRANSCRIPT_LENGTH,
};
use engram_core::errors::ConsolidationError;
use engram_core::memory::{Memory, MemorySource, NewMemory, WriteOutcome};
use engram_core::models::{
    Claim, ClaimType, ConsolidationHistory, ConsolidationResult, ConsolidationStatus,
};
use engram_core::traits::{IEmbeddingProvider, IHistoryStorage, ILanguageModel};
use engram_core::{EngramError, EngramResult};
use engram_embeddings::find_duplicate_pairs;
use engram_entities::EntityHubService;
use engram_graph::KnowledgeGraph;
use engram_processor::MemoryProcessor;

use crate::conflicts;
use crate::dedup;

/// Engine for consolidating conversation transcripts into memories.
/// One run per user at a time; a second call while one is in flight is a
/// conflict.
pub struct ConsolidationEngine {
    processor: Arc<MemoryProcessor>,
    graph: Arc<KnowledgeGraph>,
    entities: Arc<EntityHubService>,
    embedder: Arc<dyn IEmbeddingProvider>,
    llm: Arc<dyn ILanguageModel>,
    history: Arc<dyn IHistoryStorage>,
    config: ConsolidationConfig,
    running: DashMap<Uuid, ()>,
}

impl ConsolidationEngine {
    pub fn new(
        processor: Arc<MemoryProcessor>,
        graph: Arc<KnowledgeGraph>,
        entities: Arc<EntityHubService>,
        embedder: Arc<dyn IEmbeddingProvider>,
        llm: Arc<dyn ILanguageModel>,
        history: Arc<dyn IHistoryStorage>,
        config: ConsolidationConfig,
    ) -> Self {
        Self {
            processor,
            graph,
            entities,
            embedder,
            llm,
            history,
            config,
            running: DashMap::new(),
        }
    }

    /// Consolidate a session transcript into memories. Runtime failures
    /// land in the returned result (status `failed`) with a history row;
    /// only validation problems surface as errors.
    pub async fn consolidate(
        &self,
        user_id: Uuid,
        transcript: &str,
        conversation_id: Option<String>,
    ) -> EngramResult<ConsolidationResult> {
        let length = transcript.chars().count();
        if length < MIN_TRANSCRIPT_LENGTH {
            return Err(EngramError::Consolidation(
                ConsolidationError::TranscriptTooShort {
                    length,
                    minimum: MIN_TRANSCRIPT_LENGTH,
                },
            ));
        }
        if length > MAX_TRANSCRIPT_LENGTH {
            return Err(EngramError::Consolidation(
                ConsolidationError::TranscriptTooLong {
                    length,
                    maximum: MAX_TRANSCRIPT_LENGTH,
                },
            ));
        }

        if self.running.insert(user_id, ()).is_some() {
            return Err(EngramError::Consolidation(ConsolidationError::AlreadyRunning));
        }
        let _guard = RunGuard {
            running: &self.running,
            user_id,
        };

        let started = Instant::now();
        let consolidation_id = Uuid::new_v4();

        info!(
            consolidation_id = %consolidation_id,
            user_id = %user_id,
            transcript_length = length,
            "starting consolidation"
        );

        let mut result = match self
            .run_pipeline(user_id, consolidation_id, transcript, &conversation_id, length)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(consolidation_id = %consolidation_id, error = %e, "consolidation failed");
                ConsolidationResult {
                    error_message: Some(e.to_string()),
                    status: ConsolidationStatus::Failed,
                    processing_time_ms: started.elapsed().as_millis() as u64,
                    ..ConsolidationResult::empty(user_id, consolidation_id, length)
                }
            }
        };
        result.processing_time_ms = started.elapsed().as_millis() as u64;

        // The audit row is written on every outcome, success or failure.
        let history = ConsolidationHistory::from_result(&result, conversation_id);
        if let Err(e) = self.history.insert(&history) {
            warn!(consolidation_id = %consolidation_id, error = %e, "failed to write history row");
        }

        info!(
            consolidation_id = %consolidation_id,
            memories_created = result.new_memories_count,
            edges_created = result.edges_created,
            status = %result.status,
            "consolidation finished"
        );
        Ok(result)
    }

    async fn run_pipeline(
        &self,
        user_id: Uuid,
        consolidation_id: Uuid,
        transcript: &str,
        conversation_id: &Option<String>,
        transcript_length: usize,
    ) -> EngramResult<ConsolidationResult> {
        // Step 1: claim extraction.
        let claims = self.llm.extract_claims(transcript).await?;
        if claims.is_empty() {
            warn!("no claims extracted from transcript");
            return Ok(ConsolidationResult::empty(
                user_id,
                consolidation_id,
                transcript_length,
            ));
        }

        // Step 2: one batched embedding round-trip.
        let texts: Vec<String> = claims.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        // Step 3: transitive duplicate grouping with confidence boosts.
        let pairs = find_duplicate_pairs(&embeddings, self.config.duplicate_threshold);
        let groups = dedup::group_duplicates(&pairs, claims.len());

        let mut claims = claims;
        let mut merged_away: HashSet<usize> = HashSet::new();
        let mut merged_count = 0usize;
        for group in &groups {
            let canonical = group.canonical();
            let boost = 0.1 * group.merged_count() as f64;
            claims[canonical].confidence = (claims[canonical].confidence + boost).min(1.0);
            merged_count += group.merged_count();
            for &member in &group.members[1..] {
                merged_away.insert(member);
            }
        }

        // Step 4: conflict detection and resolution.
        let conflict_candidates =
            conflicts::find_conflicts(&claims, &embeddings, &self.config, &merged_away);
        let mut evolved_claims: Vec<Claim> = Vec::new();
        let mut consumed: HashSet<usize> = HashSet::new();
        let mut conflicts_resolved = 0usize;

        for conflict in &conflict_candidates {
            if consumed.contains(&conflict.a) || consumed.contains(&conflict.b) {
                continue;
            }
            let resolution = self
                .llm
                .resolve_conflict(
                    &claims[conflict.a].text,
                    &claims[conflict.b].text,
                    conflict.similarity,
                )
                .await?;
            conflicts_resolved += 1;

            if let Some(evolved) = resolution.evolved {
                evolved_claims.push(Claim {
                    text: evolved,
                    source: "conflict_resolution".to_string(),
                    confidence: resolution.confidence,
                    claim_type: ClaimType::Preference,
                    entities: Vec::new(),
                    importance: claims[conflict.a].importance.max(claims[conflict.b].importance),
                });
                consumed.insert(conflict.a);
                consumed.insert(conflict.b);
            }
        }

        // Step 5: final claim list = canonicals + evolved + unique unused.
        // `final_claims` pairs each claim with its extraction index so the
        // already-computed embedding can be reused on persist.
        let mut final_claims: Vec<(Claim, Option<usize>)> = Vec::new();
        for (index, claim) in claims.iter().enumerate() {
            if merged_away.contains(&index) || consumed.contains(&index) {
                continue;
            }
            final_claims.push((claim.clone(), Some(index)));
        }
        for claim in evolved_claims {
            final_claims.push((claim, None));
        }

        // Step 6: entity extraction for claims that came back without any.
        for (claim, _) in final_claims.iter_mut() {
            if claim.entities.is_empty() {
                let extraction = self.entities.extract_and_learn(user_id, &claim.text).await?;
                claim.entities = extraction.names();
                claim
                    .entities
                    .truncate(engram_core::constants::MAX_CLAIM_ENTITIES);
            }
        }

        // Step 7: persistence through the processor, in batches.
        let mut created_memories: Vec<Memory> = Vec::new();
        let mut new_memory_ids = Vec::new();
        for chunk in final_claims.chunks(CONSOLIDATION_BATCH_SIZE) {
            let batch: Vec<NewMemory> = chunk
                .iter()
                .map(|(claim, embed_index)| {
                    let mut metadata = BTreeMap::new();
                    metadata.insert(
                        "consolidation_id".to_string(),
                        consolidation_id.to_string(),
                    );
                    metadata.insert(
                        "claim_type".to_string(),
                        format!("{:?}", claim.claim_type).to_lowercase(),
                    );
                    metadata.insert("source_in_transcript".to_string(), claim.source.clone());

                    NewMemory {
                        content: claim.text.clone(),
                        memory_type: Some(claim.claim_type.memory_type()),
                        status: None,
                        entities: claim.entities.clone(),
                        domain: None,
                        category: None,
                        importance: Some(claim.importance),
                        confidence: Some(claim.confidence),
                        source: Some(MemorySource::Consolidation),
                        source_id: conversation_id.clone(),
                        metadata,
                        embedding: embed_index.map(|i| embeddings[i].clone()),
                    }
                })
                .collect();

            for (memory, outcome) in self.processor.process_batch(user_id, batch).await? {
                if matches!(
                    outcome,
                    WriteOutcome::Created | WriteOutcome::ConflictResolved
                ) {
                    new_memory_ids.push(memory.id);
                }
                created_memories.push(memory);
            }
        }

        // Step 8: relationship inference over the union of entities.
        let mut entity_to_memory: HashMap<String, Uuid> = HashMap::new();
        let mut all_entities: Vec<String> = Vec::new();
        for memory in &created_memories {
            for entity in &memory.entities {
                if !all_entities.contains(entity) {
                    all_entities.push(entity.clone());
                }
                entity_to_memory.insert(entity.clone(), memory.id);
            }
        }

        let plain_claims: Vec<Claim> = final_claims.iter().map(|(c, _)| c.clone()).collect();
        let relationships = self
            .llm
            .infer_relationships(&plain_claims, &all_entities)
            .await?;
        let edges =
            self.graph
                .create_edges_from_relationships(user_id, &relationships, &entity_to_memory)?;

        // Step 9: pattern detection.
        let patterns = self.llm.detect_patterns(&plain_claims).await?;

        let mut key_entities = all_entities;
        key_entities.truncate(20);

        Ok(ConsolidationResult {
            consolidation_id,
            user_id,
            transcript_length,
            claims_extracted: claims.len(),
            new_memories_count: new_memory_ids.len(),
            new_memory_ids,
            merged_count,
            conflicts_resolved,
            edges_created: edges.len(),
            patterns_detected: patterns,
            key_entities,
            processing_time_ms: 0,
            status: ConsolidationStatus::Completed,
            error_message: None,
        })
    }
}

/// Releases the per-user run slot when the pipeline exits by any path.
struct RunGuard<'a> {
    running: &'a DashMap<Uuid, ()>,
    user_id: Uuid,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.remove(&self.user_id);
    }
}
