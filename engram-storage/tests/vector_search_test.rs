//! Vector scan with SQL-level filters.

mod common;

use uuid::Uuid;

use engram_core::memory::{MemoryStatus, MemoryType};
use engram_core::models::RecallFilters;
use engram_core::traits::IMemoryStorage;
use engram_storage::StorageEngine;

#[test]
fn results_ordered_by_similarity() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let user = Uuid::new_v4();

    let close = common::memory(user, "close", vec![0.9, 0.1, 0.0, 0.0]);
    let far = common::memory(user, "far", vec![0.0, 0.0, 1.0, 0.0]);
    engine.create_with_links(&close, &[]).unwrap();
    engine.create_with_links(&far, &[]).unwrap();

    let results = engine
        .search_vector(user, &[1.0, 0.0, 0.0, 0.0], &RecallFilters::default(), 10)
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.id, close.id);
    assert!(results[0].1 > results[1].1);
}

#[test]
fn filters_exclude_other_statuses_and_users() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();

    let mut draft = common::memory(user, "draft", vec![1.0, 0.0, 0.0, 0.0]);
    draft.status = MemoryStatus::Draft;
    let foreign = common::memory(other, "foreign", vec![1.0, 0.0, 0.0, 0.0]);
    let active = common::memory(user, "active", vec![1.0, 0.0, 0.0, 0.0]);
    engine.create_with_links(&draft, &[]).unwrap();
    engine.create_with_links(&foreign, &[]).unwrap();
    engine.create_with_links(&active, &[]).unwrap();

    let results = engine
        .search_vector(user, &[1.0, 0.0, 0.0, 0.0], &RecallFilters::default(), 10)
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0.id, active.id);

    // Draft status can be asked for explicitly.
    let drafts = engine
        .search_vector(
            user,
            &[1.0, 0.0, 0.0, 0.0],
            &RecallFilters {
                status: Some(MemoryStatus::Draft),
                ..RecallFilters::default()
            },
            10,
        )
        .unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].0.id, draft.id);
}

#[test]
fn entity_filter_uses_json_containment() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let user = Uuid::new_v4();

    let mut tagged = common::memory(user, "tagged", vec![1.0, 0.0, 0.0, 0.0]);
    tagged.entities = vec!["TypeScript".to_string(), "React".to_string()];
    let untagged = common::memory(user, "untagged", vec![1.0, 0.0, 0.0, 0.0]);
    engine.create_with_links(&tagged, &[]).unwrap();
    engine.create_with_links(&untagged, &[]).unwrap();

    let results = engine
        .search_vector(
            user,
            &[1.0, 0.0, 0.0, 0.0],
            &RecallFilters {
                entity: Some("typescript".to_string()),
                ..RecallFilters::default()
            },
            10,
        )
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0.id, tagged.id);
}

#[test]
fn type_importance_and_category_filters() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let user = Uuid::new_v4();

    let mut pref = common::memory(user, "pref", vec![1.0, 0.0, 0.0, 0.0]);
    pref.memory_type = MemoryType::Preference;
    pref.importance = 9;
    pref.category = Some("Backend/Auth".to_string());
    let mut low = common::memory(user, "low", vec![1.0, 0.0, 0.0, 0.0]);
    low.importance = 2;
    engine.create_with_links(&pref, &[]).unwrap();
    engine.create_with_links(&low, &[]).unwrap();

    let results = engine
        .search_vector(
            user,
            &[1.0, 0.0, 0.0, 0.0],
            &RecallFilters {
                memory_type: Some(MemoryType::Preference),
                min_importance: Some(8),
                category_prefix: Some("Backend".to_string()),
                ..RecallFilters::default()
            },
            10,
        )
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0.id, pref.id);
}

#[test]
fn dimension_mismatches_are_skipped() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let user = Uuid::new_v4();

    let narrow = common::memory(user, "narrow", vec![1.0, 0.0]);
    let wide = common::memory(user, "wide", vec![1.0, 0.0, 0.0, 0.0]);
    engine.create_with_links(&narrow, &[]).unwrap();
    engine.create_with_links(&wide, &[]).unwrap();

    let results = engine
        .search_vector(user, &[1.0, 0.0, 0.0, 0.0], &RecallFilters::default(), 10)
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0.id, wide.id);
}

#[test]
fn zero_query_vector_returns_nothing() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let user = Uuid::new_v4();
    let m = common::memory(user, "m", vec![1.0, 0.0, 0.0, 0.0]);
    engine.create_with_links(&m, &[]).unwrap();

    let results = engine
        .search_vector(user, &[0.0, 0.0, 0.0, 0.0], &RecallFilters::default(), 10)
        .unwrap();
    assert!(results.is_empty());
}
