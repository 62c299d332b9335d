//! Knowledge-graph behaviour over real storage.

use std::sync::Arc;

use uuid::Uuid;

use engram_core::graph::{EdgeType, NewEdge};
use engram_core::memory::MemoryStatus;
use engram_core::models::{ChangeKind, DateRange};
use engram_core::traits::IMemoryStorage;
use engram_graph::KnowledgeGraph;
use engram_storage::StorageEngine;
use test_fixtures::memory_named;

fn setup() -> (KnowledgeGraph, Arc<StorageEngine>, Uuid) {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let graph = KnowledgeGraph::new(storage.clone(), storage.clone());
    (graph, storage, Uuid::new_v4())
}

#[test]
fn self_edges_are_conflicts() {
    let (graph, storage, user) = setup();
    let m = memory_named(user, "m", vec![1.0, 0.0, 0.0, 0.0]);
    storage.create_with_links(&m, &[]).unwrap();

    let err = graph
        .create_edge(NewEdge::new(user, m.id, m.id, EdgeType::RelatedTo))
        .unwrap_err();
    assert_eq!(err.kind(), "conflict");
}

#[test]
fn edges_require_existing_endpoints() {
    let (graph, storage, user) = setup();
    let m = memory_named(user, "m", vec![1.0, 0.0, 0.0, 0.0]);
    storage.create_with_links(&m, &[]).unwrap();

    let err = graph
        .create_edge(NewEdge::new(user, m.id, Uuid::new_v4(), EdgeType::Supports))
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[test]
fn related_traversal_matches_depth_and_strength_contract() {
    let (graph, storage, user) = setup();
    let a = memory_named(user, "a", vec![1.0, 0.0, 0.0, 0.0]);
    let b = memory_named(user, "b", vec![0.0, 1.0, 0.0, 0.0]);
    let c = memory_named(user, "c", vec![0.0, 0.0, 1.0, 0.0]);
    for m in [&a, &b, &c] {
        storage.create_with_links(m, &[]).unwrap();
    }

    let mut ab = NewEdge::new(user, a.id, b.id, EdgeType::RelatedTo);
    ab.strength = 0.8;
    let mut bc = NewEdge::new(user, b.id, c.id, EdgeType::Supports);
    bc.strength = 0.7;
    graph.create_edge(ab).unwrap();
    graph.create_edge(bc).unwrap();

    let related = graph.related(user, a.id, 2, 0.6).unwrap();
    let ids: Vec<_> = related.iter().map(|n| n.memory_id).collect();
    assert_eq!(ids, vec![b.id, c.id]);

    let related_strict = graph.related(user, a.id, 2, 0.75).unwrap();
    assert_eq!(related_strict.len(), 1);
    assert_eq!(related_strict[0].memory_id, b.id);
}

#[test]
fn mark_superseded_creates_evolution_edge_and_transitions_status() {
    let (graph, storage, user) = setup();
    let old = memory_named(user, "I prefer callbacks", vec![1.0, 0.0, 0.0, 0.0]);
    let new = memory_named(user, "I prefer async/await", vec![0.0, 1.0, 0.0, 0.0]);
    storage.create_with_links(&old, &[]).unwrap();
    storage.create_with_links(&new, &[]).unwrap();

    let edge = graph
        .mark_superseded(user, old.id, new.id, Some("preference evolved"))
        .unwrap();
    assert_eq!(edge.edge_type, EdgeType::EvolvesInto);
    assert!((edge.strength - 1.0).abs() < 1e-9);
    assert!(edge.causality);

    let old_after = storage.get(user, old.id).unwrap().unwrap();
    assert_eq!(old_after.status, MemoryStatus::Superseded);
    assert_eq!(old_after.superseded_by, Some(new.id));

    // The superseded invariant: the pointer targets an active memory.
    let target = storage.get(user, old_after.superseded_by.unwrap()).unwrap().unwrap();
    assert_eq!(target.status, MemoryStatus::Active);
}

#[test]
fn mark_superseded_rejects_inactive_replacement() {
    let (graph, storage, user) = setup();
    let old = memory_named(user, "old", vec![1.0, 0.0, 0.0, 0.0]);
    let mut replacement = memory_named(user, "replacement", vec![0.0, 1.0, 0.0, 0.0]);
    replacement.status = MemoryStatus::Draft;
    storage.create_with_links(&old, &[]).unwrap();
    storage.create_with_links(&replacement, &[]).unwrap();

    let err = graph
        .mark_superseded(user, old.id, replacement.id, None)
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[test]
fn contradictions_come_from_both_directions() {
    let (graph, storage, user) = setup();
    let a = memory_named(user, "a", vec![1.0, 0.0, 0.0, 0.0]);
    let b = memory_named(user, "b", vec![0.0, 1.0, 0.0, 0.0]);
    let c = memory_named(user, "c", vec![0.0, 0.0, 1.0, 0.0]);
    for m in [&a, &b, &c] {
        storage.create_with_links(m, &[]).unwrap();
    }

    graph
        .create_edge(NewEdge::new(user, a.id, b.id, EdgeType::Contradicts))
        .unwrap();
    graph
        .create_edge(NewEdge::new(user, c.id, a.id, EdgeType::Contradicts))
        .unwrap();

    let contradictions = graph.find_contradictions(user, a.id).unwrap();
    assert_eq!(contradictions.len(), 2);
}

#[test]
fn evolution_timeline_classifies_changes() {
    let (graph, storage, user) = setup();

    let mut first = memory_named(user, "Trying TypeScript for a side project", vec![1.0, 0.0, 0.0, 0.0]);
    first.entities = vec!["TypeScript".to_string()];
    first.importance = 5;
    let mut second = memory_named(user, "TypeScript is now my main language", vec![0.0, 1.0, 0.0, 0.0]);
    second.entities = vec!["TypeScript".to_string()];
    second.importance = 8;
    second.created_at = first.created_at + chrono::Duration::seconds(10);
    storage.create_with_links(&first, &[]).unwrap();
    storage.create_with_links(&second, &[]).unwrap();

    let timeline = graph
        .evolution_timeline(user, "typescript", DateRange::AllTime)
        .unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].change, ChangeKind::Introduced);
    assert_eq!(timeline[1].change, ChangeKind::Strengthened);

    // With an evolution edge, the second mention reads as evolved.
    graph
        .mark_superseded(user, first.id, second.id, None)
        .unwrap();
    let timeline = graph
        .evolution_timeline(user, "typescript", DateRange::AllTime)
        .unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[1].change, ChangeKind::Evolved);
}
