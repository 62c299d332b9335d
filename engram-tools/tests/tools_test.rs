//! End-to-end tool-surface scenarios.

use std::sync::Arc;

use uuid::Uuid;

use engram_core::config::EngramConfig;
use engram_core::graph::EdgeType;
use engram_core::memory::MemoryStatus;
use engram_core::models::ClaimType;
use engram_core::traits::{IEdgeStorage, IMemoryStorage};
use engram_storage::StorageEngine;
use engram_tools::tools::{
    analyze, consolidate, delete, export, recall, refine, remember, update,
};
use engram_tools::EngramContext;
use test_fixtures::{claim, ScriptedEmbedder, ScriptedLanguageModel};

struct Harness {
    context: EngramContext,
    storage: Arc<StorageEngine>,
    embedder: Arc<ScriptedEmbedder>,
    llm: Arc<ScriptedLanguageModel>,
    user: Uuid,
}

fn harness() -> Harness {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let embedder = Arc::new(ScriptedEmbedder::new(8));
    let llm = Arc::new(ScriptedLanguageModel::new());
    let context = EngramContext::build_with(
        EngramConfig::default(),
        storage.clone(),
        embedder.clone(),
        llm.clone(),
    )
    .unwrap();
    Harness {
        context,
        storage,
        embedder,
        llm,
        user: Uuid::new_v4(),
    }
}

fn remember_input(content: &str) -> remember::RememberInput {
    remember::RememberInput {
        content: content.to_string(),
        memory_type: "preference".to_string(),
        entities: None,
        importance: None,
        metadata: None,
    }
}

fn recall_input(query: &str) -> recall::RecallInput {
    serde_json::from_value(serde_json::json!({ "query": query })).unwrap()
}

#[tokio::test]
async fn scenario_remember_twice_deduplicates() {
    let h = harness();
    let content = "I prefer async/await over callbacks";

    let first = remember::remember(&h.context, h.user, remember_input(content))
        .await
        .unwrap();
    assert_eq!(first.status, "created");

    let second = remember::remember(&h.context, h.user, remember_input(content))
        .await
        .unwrap();
    assert_eq!(second.status, "deduplicated");
    assert_eq!(second.memory_id, first.memory_id);
}

#[tokio::test]
async fn scenario_evolution_then_recall_hides_the_old_preference() {
    let h = harness();
    let old_content = "I prefer async/await over callbacks";
    let new_content = "I now prefer plain promises over async/await";

    // Conflict band (cos ≈ 0.707) between old and new; the query lands
    // near both.
    h.embedder
        .program(old_content, vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    h.embedder
        .program(new_content, vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    h.embedder.program(
        "what do I prefer for async code?",
        vec![1.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );
    h.llm.mark_contradictory("async/await", "plain promises");

    let first = remember::remember(&h.context, h.user, remember_input(old_content))
        .await
        .unwrap();

    let second = remember::remember(&h.context, h.user, remember_input(new_content))
        .await
        .unwrap();
    assert_eq!(second.status, "conflict_resolved");

    // The old memory is superseded by the new one, linked by evolution.
    let old = h.storage.get(h.user, first.memory_id).unwrap().unwrap();
    assert_eq!(old.status, MemoryStatus::Superseded);
    assert_eq!(old.superseded_by, Some(second.memory_id));
    let edges = h
        .storage
        .edges_from(h.user, first.memory_id, Some(EdgeType::EvolvesInto))
        .unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].to_id, second.memory_id);

    // Recall returns only the new memory and reports the filtered one.
    let result = recall::recall(&h.context, h.user, recall_input("what do I prefer for async code?"))
        .await
        .unwrap();
    assert_eq!(result.count, 1);
    assert_eq!(result.memories[0].memory_id, second.memory_id);
    assert!(result.evolution_filtered >= 1);
}

#[tokio::test]
async fn scenario_consolidation_merges_duplicate_claims() {
    let h = harness();

    let mut a = claim("I love TypeScript", ClaimType::Preference);
    a.entities = vec!["TypeScript".to_string()];
    let mut b = claim("TypeScript is my favourite language", ClaimType::Preference);
    b.entities = vec!["TypeScript".to_string()];
    h.llm.push_claims(vec![a, b]);
    h.embedder
        .program("I love TypeScript", vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    h.embedder.program(
        "TypeScript is my favourite language",
        vec![1.0, 0.05, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );

    let input = consolidate::ConsolidateInput {
        session_transcript:
            "User: I love TypeScript. Assistant: great. User: TypeScript is my favourite language."
                .to_string(),
        conversation_id: None,
    };
    let output = consolidate::consolidate_session(&h.context, h.user, input)
        .await
        .unwrap();

    assert_eq!(output.status, "completed");
    assert_eq!(output.merged_count, 1);
    assert_eq!(output.new_memories_count, 1);

    let count = h
        .storage
        .count_by_user(h.user, MemoryStatus::Active)
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn scenario_deletion_cascade() {
    let h = harness();
    h.embedder.program(
        "I like cats more than dogs",
        vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );
    h.embedder.program(
        "I enjoy gardening on weekends",
        vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );

    let kept = remember::remember(&h.context, h.user, remember_input("I like cats more than dogs"))
        .await
        .unwrap();
    let doomed = remember::remember(
        &h.context,
        h.user,
        remember_input("I enjoy gardening on weekends"),
    )
    .await
    .unwrap();

    // Two edges touch the doomed memory.
    h.context
        .graph
        .create_edge(engram_core::graph::NewEdge::new(
            h.user,
            doomed.memory_id,
            kept.memory_id,
            EdgeType::RelatedTo,
        ))
        .unwrap();
    h.context
        .graph
        .create_edge(engram_core::graph::NewEdge::new(
            h.user,
            kept.memory_id,
            doomed.memory_id,
            EdgeType::Supports,
        ))
        .unwrap();

    let output = delete::delete_memory(
        &h.context,
        h.user,
        delete::DeleteInput {
            memory_id: doomed.memory_id,
            hard_delete: false,
        },
    )
    .await
    .unwrap();

    assert!(output.deleted);
    assert_eq!(output.deletion_type, "soft");
    assert_eq!(output.related_edges_removed, 2);
    assert!(output.deleted_at.is_some());

    // No edge touching the memory survives, in either direction.
    assert!(h
        .storage
        .edges_from(h.user, doomed.memory_id, None)
        .unwrap()
        .is_empty());
    assert!(h
        .storage
        .edges_to(h.user, doomed.memory_id, None)
        .unwrap()
        .is_empty());

    // Recall never returns it again.
    h.embedder.program(
        "gardening",
        vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );
    let result = recall::recall(&h.context, h.user, recall_input("gardening"))
        .await
        .unwrap();
    assert!(result
        .memories
        .iter()
        .all(|m| m.memory_id != doomed.memory_id));
}

#[tokio::test]
async fn refine_supersedes_and_links() {
    let h = harness();

    let original = remember::remember(
        &h.context,
        h.user,
        remember_input("My team uses Jira for planning"),
    )
    .await
    .unwrap();

    let output = refine::refine_knowledge(
        &h.context,
        h.user,
        refine::RefineInput {
            memory_id: original.memory_id,
            new_content: "My team moved from Jira to Linear for planning".to_string(),
            reason: Some("tooling changed".to_string()),
        },
    )
    .await
    .unwrap();

    assert_eq!(output.status, "refined");
    assert_eq!(output.old_memory_id, original.memory_id);

    let old = h.storage.get(h.user, output.old_memory_id).unwrap().unwrap();
    assert_eq!(old.status, MemoryStatus::Superseded);

    let new = h.storage.get(h.user, output.new_memory_id).unwrap().unwrap();
    assert_eq!(new.status, MemoryStatus::Active);
    assert_eq!(
        new.metadata.get("refined_from").map(String::as_str),
        Some(old.id.to_string().as_str())
    );
    assert_eq!(new.importance, old.importance);

    // Refining a missing memory is NotFound.
    let err = refine::refine_knowledge(
        &h.context,
        h.user,
        refine::RefineInput {
            memory_id: Uuid::new_v4(),
            new_content: "irrelevant".to_string(),
            reason: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn update_patches_status_and_importance() {
    let h = harness();
    let created = remember::remember(&h.context, h.user, remember_input("I like quiet mornings"))
        .await
        .unwrap();

    let output = update::update_memory(
        &h.context,
        h.user,
        update::UpdateInput {
            memory_id: created.memory_id,
            status: Some("stale".to_string()),
            importance: Some(3),
            memory_type: None,
            content: None,
            entities: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(output.new_status, "stale");

    let after = h.storage.get(h.user, created.memory_id).unwrap().unwrap();
    assert_eq!(after.status, MemoryStatus::Stale);
    assert_eq!(after.importance, 3);

    // Deleted and superseded cannot be set directly.
    let err = update::update_memory(
        &h.context,
        h.user,
        update::UpdateInput {
            memory_id: created.memory_id,
            status: Some("deleted".to_string()),
            importance: None,
            memory_type: None,
            content: None,
            entities: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn analyze_reports_the_timeline() {
    let h = harness();
    h.embedder.program(
        "Trying TypeScript for a side project",
        vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );
    h.embedder.program(
        "TypeScript is now my main language at work every day",
        vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );

    let mut input = remember_input("Trying TypeScript for a side project");
    input.entities = Some(vec!["TypeScript".to_string()]);
    remember::remember(&h.context, h.user, input).await.unwrap();

    let mut input = remember_input("TypeScript is now my main language at work every day");
    input.entities = Some(vec!["TypeScript".to_string(), "work".to_string()]);
    input.importance = Some(9);
    remember::remember(&h.context, h.user, input).await.unwrap();

    let output = analyze::analyze_evolution(
        &h.context,
        h.user,
        analyze::AnalyzeInput {
            entity_id: None,
            entity_name: Some("TypeScript".to_string()),
            time_window: "all_time".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(output.entity_name, "TypeScript");
    assert_eq!(output.total_mentions, 2);
    assert!(output.first_mentioned.is_some());
    assert!(output.related_entities.contains(&"work".to_string()));

    // Asking without any identifier is a validation error.
    let err = analyze::analyze_evolution(
        &h.context,
        h.user,
        analyze::AnalyzeInput {
            entity_id: None,
            entity_name: None,
            time_window: "all_time".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn export_import_round_trip_preserves_fields() {
    let h = harness();

    let mut input = remember_input("I always review PRs before lunch");
    input.entities = Some(vec!["PRs".to_string()]);
    input.importance = Some(7);
    let created = remember::remember(&h.context, h.user, input).await.unwrap();

    let exported = export::export_memories(
        &h.context,
        h.user,
        export::ExportInput {
            format: "json".to_string(),
            memory_type: None,
            include_embeddings: false,
        },
    )
    .await
    .unwrap();
    assert_eq!(exported.count, 1);
    assert!(exported.file_size_bytes > 0);

    // Import into a fresh system preserves identity fields.
    let h2 = harness();
    let imported = export::import_memories(&h2.context, h2.user, &exported.data)
        .await
        .unwrap();
    assert_eq!(imported.imported, 1);

    let copy = h2.storage.get(h2.user, created.memory_id).unwrap().unwrap();
    assert_eq!(copy.id, created.memory_id);
    assert_eq!(copy.content, "I always review PRs before lunch");
    assert_eq!(copy.importance, 7);
    assert_eq!(copy.entities, vec!["PRs".to_string()]);
    assert_eq!(copy.status, MemoryStatus::Active);
}

#[tokio::test]
async fn csv_export_renders_rows() {
    let h = harness();
    remember::remember(&h.context, h.user, remember_input("CSV export check"))
        .await
        .unwrap();

    let exported = export::export_memories(
        &h.context,
        h.user,
        export::ExportInput {
            format: "csv".to_string(),
            memory_type: None,
            include_embeddings: false,
        },
    )
    .await
    .unwrap();

    let csv = exported.data.as_str().unwrap();
    assert!(csv.starts_with("id,content,"));
    assert_eq!(csv.lines().count(), 2);
}

#[tokio::test]
async fn cached_preferences_follow_the_write_path() {
    let h = harness();
    h.embedder.program(
        "I prefer dark roast coffee",
        vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );
    h.embedder.program(
        "I prefer standing desks",
        vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    );

    remember::remember(&h.context, h.user, remember_input("I prefer dark roast coffee"))
        .await
        .unwrap();
    let first = h.context.user_preferences(h.user, 50).unwrap();
    assert_eq!(first.len(), 1);

    // A later write invalidates the namespace, so the next read sees both.
    remember::remember(&h.context, h.user, remember_input("I prefer standing desks"))
        .await
        .unwrap();
    let second = h.context.user_preferences(h.user, 50).unwrap();
    assert_eq!(second.len(), 2);

    let stats = h.context.user_stats(h.user).unwrap();
    assert_eq!(stats.total_memories, 2);
    assert_eq!(stats.preference_count, 2);
}

#[tokio::test]
async fn context_shutdown_stops_background_tasks() {
    let h = harness();
    h.context.shutdown().await;
}

#[tokio::test]
async fn tool_specs_cover_the_surface() {
    let specs = engram_tools::tools::all_specs();
    let names: Vec<&str> = specs
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "remember",
            "recall",
            "consolidate_session",
            "refine_knowledge",
            "update_memory",
            "analyze_evolution",
            "export_memories",
            "delete_memory"
        ]
    );
}
