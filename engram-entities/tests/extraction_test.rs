//! End-to-end extraction and learning over real storage.

use std::sync::Arc;

use uuid::Uuid;

use engram_core::entity::{EntitySource, ExtractionTier, HubType};
use engram_core::traits::{IHubStorage, IMemoryStorage};
use engram_entities::EntityHubService;
use engram_storage::StorageEngine;
use test_fixtures::{memory_named, ScriptedLanguageModel};

fn service() -> (EntityHubService, Arc<StorageEngine>, Arc<ScriptedLanguageModel>) {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let llm = Arc::new(ScriptedLanguageModel::new());
    let service = EntityHubService::new(storage.clone(), llm.clone());
    (service, storage, llm)
}

#[tokio::test]
async fn dictionary_terms_are_found_without_the_llm() {
    let (service, _storage, llm) = service();
    llm.set_unavailable(true);
    let user = Uuid::new_v4();

    // The LLM pass degrades gracefully; dictionary hits still come back.
    let result = service
        .extract_and_learn(user, "I moved the backend from Flask to FastAPI")
        .await
        .unwrap();

    let names: Vec<_> = result.entities.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"FastAPI"));
    assert!(names.contains(&"Flask"));
    assert!(result.from_dictionary >= 2);
    assert_eq!(result.from_llm, 0);
}

#[tokio::test]
async fn llm_discoveries_become_hubs() {
    let (service, storage, llm) = service();
    let user = Uuid::new_v4();
    llm.set_entities(vec!["Weekend Cabin Project".to_string()]);

    let result = service
        .extract_and_learn(user, "I started planning something new yesterday")
        .await
        .unwrap();

    assert_eq!(result.from_llm, 1);
    let hub = storage
        .get_by_name(user, "weekend cabin project")
        .unwrap()
        .expect("hub learned from LLM");
    assert_eq!(hub.source, EntitySource::Llm);
}

#[tokio::test]
async fn learned_hubs_match_on_later_texts_and_count_usage() {
    let (service, storage, _llm) = service();
    let user = Uuid::new_v4();

    let (hub, _) = service
        .get_or_create(
            user,
            "Sarah",
            HubType::Person,
            Some("Personal Contacts"),
            EntitySource::UserDefined,
            1.0,
        )
        .unwrap();

    let result = service
        .extract_and_learn(user, "Met Sarah for coffee")
        .await
        .unwrap();
    assert!(result
        .entities
        .iter()
        .any(|e| e.name == "Sarah" && e.tier == ExtractionTier::Dictionary));

    let after = storage.get_by_id(user, hub.id).unwrap().unwrap();
    assert_eq!(after.usage_count, 2);
}

#[tokio::test]
async fn linking_builds_upserted_rows() {
    let (service, storage, _llm) = service();
    let user = Uuid::new_v4();

    let mut memory = memory_named(user, "TypeScript with React is my stack", vec![1.0, 0.0, 0.0, 0.0]);
    memory.entities = vec!["TypeScript".to_string(), "React".to_string()];
    storage.create_with_links(&memory, &[]).unwrap();

    let linked = service
        .link_memory_to_entities(&memory, &memory.entities.clone())
        .unwrap();
    assert_eq!(linked, 2);

    let links = storage.links_for_memory(user, memory.id).unwrap();
    assert_eq!(links.len(), 2);
    assert!(links.iter().any(|l| l.is_primary));

    let hub = storage.get_by_name(user, "typescript").unwrap().unwrap();
    assert_eq!(hub.memory_count, 1);
}
