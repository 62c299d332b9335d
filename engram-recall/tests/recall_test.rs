//! Recall pipeline behaviour over real storage.

use std::sync::Arc;

use uuid::Uuid;

use engram_core::config::RecallConfig;
use engram_core::graph::{EdgeType, NewEdge};
use engram_core::memory::MemoryStatus;
use engram_core::models::{RecallFilters, RecallOptions};
use engram_core::entity::{EntitySource, HubType, MemoryEntityLink};
use engram_core::traits::{IEdgeStorage, IHubStorage, IMemoryStorage};
use engram_recall::RecallEngine;
use engram_storage::StorageEngine;
use test_fixtures::{memory_named, ScriptedEmbedder};

struct Harness {
    engine: RecallEngine,
    storage: Arc<StorageEngine>,
    embedder: Arc<ScriptedEmbedder>,
    user: Uuid,
}

fn harness() -> Harness {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let embedder = Arc::new(ScriptedEmbedder::new(4));
    let engine = RecallEngine::new(
        storage.clone(),
        storage.clone(),
        storage.clone(),
        embedder.clone(),
        RecallConfig::default(),
    );
    Harness {
        engine,
        storage,
        embedder,
        user: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn evolution_filter_hides_superseded_content() {
    let h = harness();
    h.embedder.program("query", vec![1.0, 0.0, 0.0, 0.0]);

    let old = memory_named(h.user, "I prefer callbacks", vec![1.0, 0.0, 0.0, 0.0]);
    let new = memory_named(h.user, "I prefer async/await", vec![0.95, 0.3, 0.0, 0.0]);
    h.storage.create_with_links(&old, &[]).unwrap();
    h.storage.create_with_links(&new, &[]).unwrap();
    h.storage
        .insert(&NewEdge::new(h.user, old.id, new.id, EdgeType::EvolvesInto))
        .unwrap();

    let result = h
        .engine
        .recall(
            h.user,
            "query",
            &RecallFilters::default(),
            10,
            0,
            RecallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.count, 1);
    assert_eq!(result.memories[0].memory.id, new.id);
    assert!(result.evolution_filtered >= 1);
    assert!(!result.partial);
}

#[tokio::test]
async fn evolution_filter_drops_the_source_even_when_the_target_is_absent() {
    let h = harness();
    // The query only matches the obsolete memory; its replacement is far
    // away in vector space.
    h.embedder.program("query", vec![1.0, 0.0, 0.0, 0.0]);

    let old = memory_named(h.user, "obsolete fact", vec![1.0, 0.0, 0.0, 0.0]);
    let new = memory_named(h.user, "replacement fact", vec![0.0, 0.0, 0.0, 1.0]);
    h.storage.create_with_links(&old, &[]).unwrap();
    h.storage.create_with_links(&new, &[]).unwrap();
    h.storage
        .insert(&NewEdge::new(h.user, old.id, new.id, EdgeType::EvolvesInto))
        .unwrap();

    let result = h
        .engine
        .recall(
            h.user,
            "query",
            &RecallFilters::default(),
            10,
            0,
            RecallOptions::default(),
        )
        .await
        .unwrap();

    // The obsolete memory is hidden even though its replacement did not
    // make the candidate set.
    assert!(result.memories.iter().all(|s| s.memory.id != old.id));
    assert_eq!(result.evolution_filtered, 1);
}

#[tokio::test]
async fn evolution_filter_can_be_disabled() {
    let h = harness();
    h.embedder.program("query", vec![1.0, 0.0, 0.0, 0.0]);

    let old = memory_named(h.user, "old", vec![1.0, 0.0, 0.0, 0.0]);
    let new = memory_named(h.user, "new", vec![0.9, 0.1, 0.0, 0.0]);
    h.storage.create_with_links(&old, &[]).unwrap();
    h.storage.create_with_links(&new, &[]).unwrap();
    h.storage
        .insert(&NewEdge::new(h.user, old.id, new.id, EdgeType::EvolvesInto))
        .unwrap();

    let options = RecallOptions {
        respect_evolution: false,
        ..RecallOptions::default()
    };
    let result = h
        .engine
        .recall(h.user, "query", &RecallFilters::default(), 10, 0, options)
        .await
        .unwrap();
    assert_eq!(result.count, 2);
    assert_eq!(result.evolution_filtered, 0);
}

#[tokio::test]
async fn entity_expansion_fills_short_results() {
    let h = harness();
    h.embedder.program("query", vec![1.0, 0.0, 0.0, 0.0]);

    // One primary hit tagged with an entity; another memory shares the
    // entity hub but is semantically far from the query.
    let mut seed = memory_named(h.user, "seed about typescript", vec![1.0, 0.0, 0.0, 0.0]);
    seed.entities = vec!["TypeScript".to_string()];
    let linked = memory_named(h.user, "another typescript note", vec![0.0, 0.0, 0.0, 1.0]);
    h.storage.create_with_links(&seed, &[]).unwrap();
    h.storage.create_with_links(&linked, &[]).unwrap();

    let (hub, _) = h
        .storage
        .get_or_create(h.user, "TypeScript", HubType::Tech, None, EntitySource::Llm, 0.9)
        .unwrap();
    for memory_id in [seed.id, linked.id] {
        h.storage
            .upsert_link(&MemoryEntityLink {
                memory_id,
                entity_id: hub.id,
                user_id: h.user,
                strength: 0.8,
                is_primary: true,
                mention_count: 1,
                context_snippet: None,
            })
            .unwrap();
    }

    let result = h
        .engine
        .recall(
            h.user,
            "query",
            &RecallFilters::default(),
            5,
            0,
            RecallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.count, 2);
    assert_eq!(result.entity_expanded, 1);
    let expanded = result
        .memories
        .iter()
        .find(|s| s.memory.id == linked.id)
        .unwrap();
    assert!((expanded.similarity - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn graph_expansion_walks_supporting_edges() {
    let h = harness();
    h.embedder.program("query", vec![1.0, 0.0, 0.0, 0.0]);

    let seed = memory_named(h.user, "seed", vec![1.0, 0.0, 0.0, 0.0]);
    let supported = memory_named(h.user, "supported", vec![0.0, 0.0, 0.0, 1.0]);
    let evolved = memory_named(h.user, "evolved target", vec![0.0, 0.0, 1.0, 0.0]);
    for m in [&seed, &supported, &evolved] {
        h.storage.create_with_links(m, &[]).unwrap();
    }
    h.storage
        .insert(&NewEdge::new(h.user, seed.id, supported.id, EdgeType::Supports))
        .unwrap();
    // Only related/depends-on/supports edges are walked.
    h.storage
        .insert(&NewEdge::new(h.user, seed.id, evolved.id, EdgeType::Likes))
        .unwrap();

    let options = RecallOptions {
        include_related: true,
        ..RecallOptions::default()
    };
    let result = h
        .engine
        .recall(h.user, "query", &RecallFilters::default(), 5, 0, options)
        .await
        .unwrap();

    let ids: Vec<_> = result.memories.iter().map(|s| s.memory.id).collect();
    assert!(ids.contains(&seed.id));
    assert!(ids.contains(&supported.id));
    assert!(!ids.contains(&evolved.id));
}

#[tokio::test]
async fn returned_memories_count_as_accessed() {
    let h = harness();
    h.embedder.program("query", vec![1.0, 0.0, 0.0, 0.0]);
    let m = memory_named(h.user, "memory", vec![1.0, 0.0, 0.0, 0.0]);
    h.storage.create_with_links(&m, &[]).unwrap();

    h.engine
        .recall(
            h.user,
            "query",
            &RecallFilters::default(),
            10,
            0,
            RecallOptions::default(),
        )
        .await
        .unwrap();

    let after = h.storage.get(h.user, m.id).unwrap().unwrap();
    assert_eq!(after.access_count, 1);
    assert!(after.last_accessed.is_some());
}

#[tokio::test]
async fn offset_and_limit_slice_after_ranking() {
    let h = harness();
    h.embedder.program("query", vec![1.0, 0.0, 0.0, 0.0]);

    for i in 0..5 {
        let m = memory_named(
            h.user,
            &format!("memory {i}"),
            vec![1.0, i as f32 * 0.1, 0.0, 0.0],
        );
        h.storage.create_with_links(&m, &[]).unwrap();
    }

    let options = RecallOptions {
        apply_recency_boost: false,
        ..RecallOptions::default()
    };
    let page_one = h
        .engine
        .recall(h.user, "query", &RecallFilters::default(), 2, 0, options)
        .await
        .unwrap();
    let page_two = h
        .engine
        .recall(h.user, "query", &RecallFilters::default(), 2, 2, options)
        .await
        .unwrap();

    assert_eq!(page_one.count, 2);
    assert_eq!(page_two.count, 2);
    let ids_one: Vec<_> = page_one.memories.iter().map(|s| s.memory.id).collect();
    assert!(page_two
        .memories
        .iter()
        .all(|s| !ids_one.contains(&s.memory.id)));
    assert_eq!(page_one.total_available, 5);
}

#[tokio::test]
async fn deleted_memories_never_come_back() {
    let h = harness();
    h.embedder.program("query", vec![1.0, 0.0, 0.0, 0.0]);

    let m = memory_named(h.user, "to be deleted", vec![1.0, 0.0, 0.0, 0.0]);
    h.storage.create_with_links(&m, &[]).unwrap();
    h.storage.delete_with_cascade(h.user, m.id, false).unwrap();

    let result = h
        .engine
        .recall(
            h.user,
            "query",
            &RecallFilters::default(),
            10,
            0,
            RecallOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(result.count, 0);
}

#[tokio::test]
async fn entity_filter_rescues_zero_primary_hits() {
    let h = harness();
    // The query embedding is orthogonal to everything stored.
    h.embedder.program("unrelated query", vec![0.0, 0.0, 1.0, 0.0]);

    let linked = memory_named(h.user, "notes on redis tuning", vec![1.0, 0.0, 0.0, 0.0]);
    h.storage.create_with_links(&linked, &[]).unwrap();
    let (hub, _) = h
        .storage
        .get_or_create(h.user, "redis", HubType::Tech, None, EntitySource::Llm, 0.9)
        .unwrap();
    h.storage
        .upsert_link(&MemoryEntityLink {
            memory_id: linked.id,
            entity_id: hub.id,
            user_id: h.user,
            strength: 0.9,
            is_primary: true,
            mention_count: 1,
            context_snippet: None,
        })
        .unwrap();

    let filters = RecallFilters {
        entity: Some("redis".to_string()),
        ..RecallFilters::default()
    };
    // The vector scan honours the entity filter but scores zero against
    // the orthogonal query; the expansion stage still finds the hub.
    let result = h
        .engine
        .recall(h.user, "unrelated query", &filters, 5, 0, RecallOptions::default())
        .await
        .unwrap();

    assert_eq!(result.count, 1);
    assert_eq!(result.memories[0].memory.id, linked.id);
    assert_eq!(result.entity_expanded, 1);
}

#[tokio::test]
async fn empty_and_very_long_queries_return_cleanly() {
    let h = harness();
    let m = memory_named(h.user, "anything", vec![1.0, 0.0, 0.0, 0.0]);
    h.storage.create_with_links(&m, &[]).unwrap();

    // Empty query: the zero-vector search finds nothing and nothing breaks.
    let result = h
        .engine
        .recall(h.user, "", &RecallFilters::default(), 10, 0, RecallOptions::default())
        .await
        .unwrap();
    assert_eq!(result.count, 0);

    // A 1000-char query embeds like any other text.
    let long_query = "memory ".repeat(143);
    let result = h
        .engine
        .recall(h.user, &long_query, &RecallFilters::default(), 10, 0, RecallOptions::default())
        .await
        .unwrap();
    assert!(result.count <= 1);
}

#[tokio::test]
async fn limit_above_the_cap_is_rejected() {
    let h = harness();
    let err = h
        .engine
        .recall(
            h.user,
            "query",
            &RecallFilters::default(),
            51,
            0,
            RecallOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn non_ascii_query_and_content_round_trip() {
    let h = harness();
    let m = memory_named(h.user, "Ich bevorzuge Kaffee über Tee ☕", vec![1.0, 0.0, 0.0, 0.0]);
    h.storage.create_with_links(&m, &[]).unwrap();
    h.embedder
        .program("Was bevorzuge ich?", vec![1.0, 0.0, 0.0, 0.0]);

    let result = h
        .engine
        .recall(
            h.user,
            "Was bevorzuge ich?",
            &RecallFilters::default(),
            10,
            0,
            RecallOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(result.count, 1);
    assert!(result.memories[0].memory.content.contains('☕'));
}
