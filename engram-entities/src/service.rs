//! EntityHubService — extraction plus learning: every discovered entity
//! becomes (or reinforces) a per-user hub, and memories link to hubs.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use engram_core::constants::DICTIONARY_HUB_LIMIT;
use engram_core::entity::{
    EntityHub, EntitySource, ExtractionResult, ExtractionTier, HubType, MemoryEntityLink,
};
use engram_core::errors::EngramResult;
use engram_core::memory::Memory;
use engram_core::traits::{IHubStorage, ILanguageModel};

use crate::extractor::EntityExtractor;

/// The entity subsystem facade the engines call.
pub struct EntityHubService {
    hubs: Arc<dyn IHubStorage>,
    extractor: EntityExtractor,
}

impl EntityHubService {
    pub fn new(hubs: Arc<dyn IHubStorage>, llm: Arc<dyn ILanguageModel>) -> Self {
        Self {
            hubs,
            extractor: EntityExtractor::new(llm),
        }
    }

    /// Extract entities from text and learn them: dictionary hits bump
    /// usage counters, LLM discoveries become new hubs.
    pub async fn extract_and_learn(
        &self,
        user_id: Uuid,
        text: &str,
    ) -> EngramResult<ExtractionResult> {
        let learned = self
            .hubs
            .top_by_usage(user_id, DICTIONARY_HUB_LIMIT, None)?;
        let extraction = self.extractor.extract(text, &learned, true).await?;

        for hub_id in &extraction.matched_hub_ids {
            self.hubs.touch_usage(user_id, *hub_id)?;
        }

        let mut learned_count = 0usize;
        for entity in &extraction.result.entities {
            if entity.tier == ExtractionTier::Llm {
                let (hub, created) = self.hubs.get_or_create(
                    user_id,
                    &entity.name,
                    HubType::Concept,
                    None,
                    EntitySource::Llm,
                    0.8,
                )?;
                if created {
                    learned_count += 1;
                } else {
                    self.hubs.touch_usage(user_id, hub.id)?;
                }
            }
        }

        if learned_count > 0 {
            info!(user_id = %user_id, learned = learned_count, "new entity hubs learned");
        }
        Ok(extraction.result)
    }

    /// Dictionary + heuristic tiers only; no suspension point.
    pub fn extract_fast(&self, user_id: Uuid, text: &str) -> EngramResult<ExtractionResult> {
        let learned = self
            .hubs
            .top_by_usage(user_id, DICTIONARY_HUB_LIMIT, None)?;
        Ok(self.extractor.extract_fast(text, &learned))
    }

    /// Resolve entity names to hubs (creating as needed) and return the
    /// link rows for the memory. The caller persists them atomically with
    /// the memory row.
    pub fn build_links(
        &self,
        memory: &Memory,
        entity_names: &[String],
    ) -> EngramResult<Vec<MemoryEntityLink>> {
        let content_lower = memory.content.to_lowercase();
        let mut links = Vec::with_capacity(entity_names.len());

        for (index, name) in entity_names.iter().enumerate() {
            let (hub, _) = self.hubs.get_or_create(
                memory.user_id,
                name,
                HubType::Concept,
                None,
                EntitySource::Llm,
                0.8,
            )?;

            let mention_count = count_mentions(&content_lower, &name.to_lowercase()).max(1);
            links.push(MemoryEntityLink {
                memory_id: memory.id,
                entity_id: hub.id,
                user_id: memory.user_id,
                strength: 0.7,
                is_primary: index == 0,
                mention_count: mention_count as u64,
                context_snippet: snippet_around(&memory.content, name),
            });
        }

        debug!(memory_id = %memory.id, links = links.len(), "entity links built");
        Ok(links)
    }

    /// Upsert the link rows for an already-persisted memory.
    pub fn link_memory_to_entities(
        &self,
        memory: &Memory,
        entity_names: &[String],
    ) -> EngramResult<usize> {
        let links = self.build_links(memory, entity_names)?;
        for link in &links {
            self.hubs.upsert_link(link)?;
        }
        Ok(links.len())
    }

    pub fn get_or_create(
        &self,
        user_id: Uuid,
        name: &str,
        hub_type: HubType,
        category: Option<&str>,
        source: EntitySource,
        confidence: f64,
    ) -> EngramResult<(EntityHub, bool)> {
        self.hubs
            .get_or_create(user_id, name, hub_type, category, source, confidence)
    }

    pub fn search(&self, user_id: Uuid, query: &str) -> EngramResult<Vec<EntityHub>> {
        self.hubs.search(user_id, query)
    }

    pub fn top_entities(
        &self,
        user_id: Uuid,
        hub_type: Option<HubType>,
        limit: usize,
    ) -> EngramResult<Vec<EntityHub>> {
        self.hubs.top_by_usage(user_id, limit, hub_type)
    }
}

fn count_mentions(content_lower: &str, name_lower: &str) -> usize {
    if name_lower.is_empty() {
        return 0;
    }
    content_lower.matches(name_lower).count()
}

/// Up to ~120 characters of context around the first mention.
fn snippet_around(content: &str, name: &str) -> Option<String> {
    let lower = content.to_lowercase();
    let pos = lower.find(&name.to_lowercase())?;
    let start = content[..pos]
        .char_indices()
        .rev()
        .nth(59)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let end = content[pos..]
        .char_indices()
        .nth(60)
        .map(|(i, _)| pos + i)
        .unwrap_or(content.len());
    Some(content[start..end].trim().to_string())
}
