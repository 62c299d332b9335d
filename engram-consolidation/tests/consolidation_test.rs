//! The transcript pipeline end to end over real storage.

use std::sync::Arc;

use uuid::Uuid;

use engram_core::config::ConsolidationConfig;
use engram_core::graph::EdgeType;
use engram_core::memory::{MemoryStatus, MemoryType};
use engram_core::models::{ClaimType, ConflictResolution, ConsolidationStatus, EntityRelationship};
use engram_core::traits::{IHistoryStorage, IMemoryStorage, MemoryListQuery};
use engram_consolidation::ConsolidationEngine;
use engram_entities::EntityHubService;
use engram_graph::KnowledgeGraph;
use engram_processor::MemoryProcessor;
use engram_storage::{CacheService, StorageEngine};
use test_fixtures::{claim, ScriptedEmbedder, ScriptedLanguageModel};

struct Harness {
    engine: ConsolidationEngine,
    storage: Arc<StorageEngine>,
    embedder: Arc<ScriptedEmbedder>,
    llm: Arc<ScriptedLanguageModel>,
    user: Uuid,
}

fn harness() -> Harness {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let embedder = Arc::new(ScriptedEmbedder::new(8));
    let llm = Arc::new(ScriptedLanguageModel::new());
    let graph = Arc::new(KnowledgeGraph::new(storage.clone(), storage.clone()));
    let entities = Arc::new(EntityHubService::new(storage.clone(), llm.clone()));
    let cache = Arc::new(CacheService::default());
    let processor = Arc::new(MemoryProcessor::new(
        storage.clone(),
        graph.clone(),
        entities.clone(),
        embedder.clone(),
        llm.clone(),
        cache,
    ));
    let engine = ConsolidationEngine::new(
        processor,
        graph,
        entities,
        embedder.clone(),
        llm.clone(),
        storage.clone(),
        ConsolidationConfig::default(),
    );
    Harness {
        engine,
        storage,
        embedder,
        llm,
        user: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn transcript_length_bounds() {
    let h = harness();

    let err = h.engine.consolidate(h.user, "123456789", None).await.unwrap_err();
    assert_eq!(err.kind(), "validation");

    // Exactly ten characters passes validation (and yields no claims).
    let result = h.engine.consolidate(h.user, "1234567890", None).await.unwrap();
    assert_eq!(result.status, ConsolidationStatus::Completed);
    assert_eq!(result.claims_extracted, 0);

    let max = "x".repeat(100_000);
    let result = h.engine.consolidate(h.user, &max, None).await.unwrap();
    assert_eq!(result.status, ConsolidationStatus::Completed);

    let too_long = "x".repeat(100_001);
    let err = h.engine.consolidate(h.user, &too_long, None).await.unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn duplicate_claims_merge_into_one_memory() {
    let h = harness();

    let mut a = claim("I love TypeScript", ClaimType::Preference);
    a.entities = vec!["TypeScript".to_string()];
    let mut b = claim("TypeScript is my favourite language", ClaimType::Preference);
    b.entities = vec!["TypeScript".to_string()];
    h.llm.push_claims(vec![a, b]);

    // Both claims embed nearly identically → duplicate group.
    h.embedder
        .program("I love TypeScript", vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    h.embedder.program(
        "TypeScript is my favourite language",
        vec![1.0, 0.05, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );

    let result = h
        .engine
        .consolidate(
            h.user,
            "User: I love TypeScript. Assistant: great. User: TypeScript is my favourite language.",
            Some("conv-1".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(result.status, ConsolidationStatus::Completed);
    assert_eq!(result.claims_extracted, 2);
    assert_eq!(result.merged_count, 1);
    assert_eq!(result.new_memories_count, 1);

    let memories = h
        .storage
        .list_by_user(h.user, &MemoryListQuery::default())
        .unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0].memory_type, MemoryType::Preference);
    assert_eq!(memories[0].status, MemoryStatus::Active);
    // The canonical claim's confidence was boosted by its duplicate.
    assert!(memories[0].confidence > 0.8);
}

#[tokio::test]
async fn conflicting_preferences_produce_an_evolved_claim() {
    let h = harness();

    h.llm.push_claims(vec![
        claim("I prefer callbacks", ClaimType::Preference),
        claim("I prefer promises", ClaimType::Preference),
    ]);
    // cos ≈ 0.707, inside the conflict band.
    h.embedder
        .program("I prefer callbacks", vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    h.embedder
        .program("I prefer promises", vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    h.llm.push_resolution(ConflictResolution {
        resolution: "Preference moved from callbacks to promises".to_string(),
        is_real_conflict: true,
        evolved: Some("I moved from callbacks to promises for async code".to_string()),
        confidence: 0.9,
    });

    let result = h
        .engine
        .consolidate(h.user, "User: long talk about async styles...", None)
        .await
        .unwrap();

    assert_eq!(result.conflicts_resolved, 1);
    assert_eq!(result.new_memories_count, 1);

    let memories = h
        .storage
        .list_by_user(h.user, &MemoryListQuery::default())
        .unwrap();
    assert_eq!(memories.len(), 1);
    assert!(memories[0].content.contains("moved from callbacks"));
}

#[tokio::test]
async fn relationships_materialise_as_edges() {
    let h = harness();

    let mut a = claim("I use TypeScript daily", ClaimType::ToolUsage);
    a.entities = vec!["TypeScript".to_string()];
    let mut b = claim("JavaScript underpins my stack", ClaimType::Fact);
    b.entities = vec!["JavaScript".to_string()];
    h.llm.push_claims(vec![a, b]);
    h.llm.set_relationships(vec![EntityRelationship {
        from_entity: "TypeScript".to_string(),
        to_entity: "JavaScript".to_string(),
        edge_type: EdgeType::RelatedTo,
        confidence: 0.9,
    }]);

    // Keep the two claims dissimilar so both persist.
    h.embedder
        .program("I use TypeScript daily", vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    h.embedder.program(
        "JavaScript underpins my stack",
        vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );

    let result = h
        .engine
        .consolidate(h.user, "User: a chat about languages used", None)
        .await
        .unwrap();

    assert_eq!(result.new_memories_count, 2);
    assert_eq!(result.edges_created, 1);
    assert!(result.key_entities.contains(&"TypeScript".to_string()));
}

#[tokio::test]
async fn llm_failure_writes_a_failed_history_row() {
    let h = harness();
    h.llm.set_unavailable(true);

    let result = h
        .engine
        .consolidate(h.user, "a transcript that is long enough", None)
        .await
        .unwrap();

    assert_eq!(result.status, ConsolidationStatus::Failed);
    assert!(result.error_message.is_some());

    let history = IHistoryStorage::get(h.storage.as_ref(), h.user, result.consolidation_id)
        .unwrap()
        .expect("history row exists for failed runs");
    assert_eq!(history.status, ConsolidationStatus::Failed);
}

#[tokio::test]
async fn history_row_written_on_success() {
    let h = harness();
    h.llm.push_claims(vec![claim("I like Rust", ClaimType::Preference)]);

    let result = h
        .engine
        .consolidate(h.user, "User: I like Rust a lot.", Some("conv-9".to_string()))
        .await
        .unwrap();

    let history = IHistoryStorage::get(h.storage.as_ref(), h.user, result.consolidation_id)
        .unwrap()
        .unwrap();
    assert_eq!(history.status, ConsolidationStatus::Completed);
    assert_eq!(history.new_memories_created, 1);
    assert_eq!(history.conversation_id.as_deref(), Some("conv-9"));
}
