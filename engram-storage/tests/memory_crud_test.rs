//! CRUD, status transitions, and cascade deletion.

mod common;

use uuid::Uuid;

use engram_core::memory::{MemoryStatus, MemoryType};
use engram_core::traits::{IEdgeStorage, IHubStorage, IMemoryStorage};
use engram_core::graph::{EdgeType, NewEdge};
use engram_core::entity::{EntitySource, HubType, MemoryEntityLink};
use engram_storage::StorageEngine;

#[test]
fn create_and_get_roundtrip() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let user = Uuid::new_v4();
    let mut m = common::memory(user, "TypeScript is my favourite language", vec![1.0, 0.0, 0.0, 0.0]);
    m.entities = vec!["TypeScript".to_string()];
    m.domain = Some("KnowWhere".to_string());
    m.category = Some("Backend/Languages".to_string());

    engine.create_with_links(&m, &[]).unwrap();

    let fetched = engine.get(user, m.id).unwrap().unwrap();
    assert_eq!(fetched.content, m.content);
    assert_eq!(fetched.memory_type, MemoryType::Semantic);
    assert_eq!(fetched.entities, vec!["TypeScript".to_string()]);
    assert_eq!(fetched.domain.as_deref(), Some("KnowWhere"));
    assert_eq!(fetched.embedding.as_deref(), Some(&[1.0f32, 0.0, 0.0, 0.0][..]));
    assert_eq!(fetched.content_hash, m.content_hash);
}

#[test]
fn get_is_user_scoped() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let m = common::memory(alice, "private to alice", vec![1.0, 0.0, 0.0, 0.0]);
    engine.create_with_links(&m, &[]).unwrap();

    assert!(engine.get(alice, m.id).unwrap().is_some());
    assert!(engine.get(bob, m.id).unwrap().is_none());
}

#[test]
fn update_missing_memory_is_not_found() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let m = common::memory(Uuid::new_v4(), "ghost", vec![1.0, 0.0, 0.0, 0.0]);
    let err = engine.update(&m).unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[test]
fn set_status_supersedes_with_pointer() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let user = Uuid::new_v4();
    let old = common::memory(user, "I prefer callbacks", vec![1.0, 0.0, 0.0, 0.0]);
    let new = common::memory(user, "I prefer async/await", vec![0.0, 1.0, 0.0, 0.0]);
    engine.create_with_links(&old, &[]).unwrap();
    engine.create_with_links(&new, &[]).unwrap();

    assert!(engine
        .set_status(user, old.id, MemoryStatus::Superseded, Some(new.id))
        .unwrap());

    let fetched = engine.get(user, old.id).unwrap().unwrap();
    assert_eq!(fetched.status, MemoryStatus::Superseded);
    assert_eq!(fetched.superseded_by, Some(new.id));
    assert!(fetched.deleted_at.is_none());
}

#[test]
fn reinforce_caps_confidence_and_counts_access() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let user = Uuid::new_v4();
    let mut m = common::memory(user, "repeated fact", vec![1.0, 0.0, 0.0, 0.0]);
    m.confidence = 0.95;
    engine.create_with_links(&m, &[]).unwrap();

    engine.reinforce(user, m.id, 0.1).unwrap();
    let fetched = engine.get(user, m.id).unwrap().unwrap();
    assert_eq!(fetched.access_count, 1);
    assert!((fetched.confidence - 1.0).abs() < 1e-9);
    assert!(fetched.last_accessed.is_some());
}

#[test]
fn soft_delete_cascades_edges_and_links() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let user = Uuid::new_v4();
    let a = common::memory(user, "a", vec![1.0, 0.0, 0.0, 0.0]);
    let b = common::memory(user, "b", vec![0.0, 1.0, 0.0, 0.0]);
    engine.create_with_links(&a, &[]).unwrap();
    engine.create_with_links(&b, &[]).unwrap();

    engine
        .insert(&NewEdge::new(user, a.id, b.id, EdgeType::RelatedTo))
        .unwrap();
    engine
        .insert(&NewEdge::new(user, b.id, a.id, EdgeType::Supports))
        .unwrap();

    let (hub, _) = engine
        .get_or_create(user, "rust", HubType::Tech, None, EntitySource::Llm, 0.9)
        .unwrap();
    engine
        .upsert_link(&MemoryEntityLink {
            memory_id: a.id,
            entity_id: hub.id,
            user_id: user,
            strength: 0.8,
            is_primary: true,
            mention_count: 1,
            context_snippet: None,
        })
        .unwrap();

    let cascade = engine.delete_with_cascade(user, a.id, false).unwrap();
    assert_eq!(cascade.edges_removed, 2);
    assert_eq!(cascade.links_removed, 1);
    assert!(cascade.deleted_at.is_some());

    let fetched = engine.get(user, a.id).unwrap().unwrap();
    assert_eq!(fetched.status, MemoryStatus::Deleted);
    assert!(fetched.deleted_at.is_some());

    assert!(engine.all_edges_for(user, a.id).unwrap().is_empty());
    assert!(engine.links_for_memory(user, a.id).unwrap().is_empty());

    // Hub persists with its counter back at zero.
    let hub_after = engine.get_by_id(user, hub.id).unwrap().unwrap();
    assert_eq!(hub_after.memory_count, 0);
}

#[test]
fn hard_delete_removes_the_row() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let user = Uuid::new_v4();
    let m = common::memory(user, "gone for good", vec![1.0, 0.0, 0.0, 0.0]);
    engine.create_with_links(&m, &[]).unwrap();

    let cascade = engine.delete_with_cascade(user, m.id, true).unwrap();
    assert!(cascade.deleted_at.is_none());
    assert!(engine.get(user, m.id).unwrap().is_none());
}

#[test]
fn deleting_a_missing_memory_is_not_found() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let err = engine
        .delete_with_cascade(Uuid::new_v4(), Uuid::new_v4(), false)
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[test]
fn bulk_insert_counts_rows() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let user = Uuid::new_v4();
    let memories: Vec<_> = (0..5)
        .map(|i| common::memory(user, &format!("fact {i}"), vec![1.0, 0.0, 0.0, i as f32]))
        .collect();
    assert_eq!(engine.create_bulk(&memories).unwrap(), 5);
    assert_eq!(
        engine.count_by_user(user, MemoryStatus::Active).unwrap(),
        5
    );
}
