//! Two-tier entity extraction: learned hubs + global dictionary and regex
//! heuristics first, the language model only for the unclaimed residue.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use engram_core::entity::{EntityHub, ExtractedEntity, ExtractionResult, ExtractionTier};
use engram_core::errors::EngramResult;
use engram_core::traits::ILanguageModel;

use crate::dictionary::{self, KNOWN_TECHNOLOGIES};
use crate::patterns;

/// Extracts entity names from text. Dictionary and pattern passes run
/// synchronously; the LLM pass is the only suspension point.
pub struct EntityExtractor {
    llm: Arc<dyn ILanguageModel>,
}

impl EntityExtractor {
    pub fn new(llm: Arc<dyn ILanguageModel>) -> Self {
        Self { llm }
    }

    /// Full extraction. `learned_hubs` is the user's dictionary (top hubs
    /// by usage); matches there count as dictionary hits and report which
    /// hub matched.
    pub async fn extract(
        &self,
        text: &str,
        learned_hubs: &[EntityHub],
        use_llm: bool,
    ) -> EngramResult<Extraction> {
        let mut found: BTreeMap<String, ExtractedEntity> = BTreeMap::new();
        let mut matched_hubs: Vec<uuid::Uuid> = Vec::new();
        let text_lower = text.to_lowercase();

        // Tier 1a: the user's learned hubs, names and aliases.
        for hub in learned_hubs {
            let hit = hub.match_keys().any(|key| contains_word(&text_lower, &key));
            if hit {
                let display = hub
                    .display_name
                    .clone()
                    .unwrap_or_else(|| hub.entity_name.clone());
                insert_entity(&mut found, display, ExtractionTier::Dictionary);
                matched_hubs.push(hub.id);
            }
        }

        // Tier 1b: the global technology dictionary.
        for term in KNOWN_TECHNOLOGIES {
            if contains_word(&text_lower, term) {
                insert_entity(
                    &mut found,
                    dictionary::dictionary_display(term),
                    ExtractionTier::Dictionary,
                );
            }
        }

        // Tier 2: shape heuristics.
        for name in patterns::extract(text) {
            insert_entity(&mut found, name, ExtractionTier::Heuristic);
        }

        // Tier 3: the language model, over the residue only.
        if use_llm {
            let residual = mask_matches(text, found.keys());
            if residual.chars().any(|c| c.is_alphabetic()) {
                match self.llm.extract_entities(&residual).await {
                    Ok(names) => {
                        for name in names {
                            insert_entity(&mut found, name, ExtractionTier::Llm);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "LLM entity extraction failed, keeping heuristic results");
                    }
                }
            }
        }

        let entities = normalize(found);
        debug!(
            text_length = text.len(),
            entity_count = entities.len(),
            "entities extracted"
        );

        Ok(Extraction {
            result: summarize(entities),
            matched_hub_ids: matched_hubs,
        })
    }

    /// Dictionary and pattern tiers only, no suspension.
    pub fn extract_fast(&self, text: &str, learned_hubs: &[EntityHub]) -> ExtractionResult {
        let mut found: BTreeMap<String, ExtractedEntity> = BTreeMap::new();
        let text_lower = text.to_lowercase();

        for hub in learned_hubs {
            if hub.match_keys().any(|key| contains_word(&text_lower, &key)) {
                let display = hub
                    .display_name
                    .clone()
                    .unwrap_or_else(|| hub.entity_name.clone());
                insert_entity(&mut found, display, ExtractionTier::Dictionary);
            }
        }
        for term in KNOWN_TECHNOLOGIES {
            if contains_word(&text_lower, term) {
                insert_entity(
                    &mut found,
                    dictionary::dictionary_display(term),
                    ExtractionTier::Dictionary,
                );
            }
        }
        for name in patterns::extract(text) {
            insert_entity(&mut found, name, ExtractionTier::Heuristic);
        }

        summarize(normalize(found))
    }
}

/// Extraction output plus which learned hubs fired (for usage counting).
pub struct Extraction {
    pub result: ExtractionResult,
    pub matched_hub_ids: Vec<uuid::Uuid>,
}

fn insert_entity(
    found: &mut BTreeMap<String, ExtractedEntity>,
    name: String,
    tier: ExtractionTier,
) {
    let trimmed = name.trim();
    if trimmed.chars().count() < 2 {
        return;
    }
    let key = trimmed.to_lowercase();
    found.entry(key).or_insert(ExtractedEntity {
        name: trimmed.to_string(),
        tier,
    });
}

/// Apply canonical casing and keep the sorted, deduplicated list.
fn normalize(found: BTreeMap<String, ExtractedEntity>) -> Vec<ExtractedEntity> {
    found
        .into_iter()
        .map(|(key, mut entity)| {
            if let Some(canonical) = dictionary::canonical_casing(&key) {
                entity.name = canonical.to_string();
            }
            entity
        })
        .collect()
}

fn summarize(entities: Vec<ExtractedEntity>) -> ExtractionResult {
    let from_dictionary = entities
        .iter()
        .filter(|e| e.tier == ExtractionTier::Dictionary)
        .count();
    let from_llm = entities
        .iter()
        .filter(|e| e.tier == ExtractionTier::Llm)
        .count();
    ExtractionResult {
        entities,
        from_dictionary,
        from_llm,
    }
}

/// Whole-word containment over lowercase text. Word edges are any
/// non-alphanumeric characters, so terms like "c++" and "async/await"
/// match as written.
fn contains_word(text_lower: &str, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = text_lower[start..].find(term) {
        let begin = start + pos;
        let end = begin + term.len();
        let left_ok = begin == 0
            || !text_lower[..begin]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let right_ok = end >= text_lower.len()
            || !text_lower[end..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric());
        if left_ok && right_ok {
            return true;
        }
        start = end;
    }
    false
}

/// Blank out every already-claimed term so the LLM only sees the residue.
fn mask_matches<'a>(text: &str, claimed: impl Iterator<Item = &'a String>) -> String {
    let mut masked = text.to_string();
    for key in claimed {
        let lower = masked.to_lowercase();
        let mut result = String::with_capacity(masked.len());
        let mut cursor = 0;
        while let Some(pos) = lower[cursor..].find(key.as_str()) {
            let begin = cursor + pos;
            result.push_str(&masked[cursor..begin]);
            result.push_str(&" ".repeat(key.len()));
            cursor = begin + key.len();
        }
        result.push_str(&masked[cursor..]);
        masked = result;
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_boundaries_hold() {
        assert!(contains_word("i use rust daily", "rust"));
        assert!(!contains_word("trusted tooling", "rust"));
        assert!(contains_word("c++ is fast", "c++"));
        assert!(contains_word("prefer async/await here", "async/await"));
    }

    #[test]
    fn masking_removes_claimed_terms() {
        let claimed = vec!["rust".to_string()];
        let masked = mask_matches("I write Rust at work", claimed.iter());
        assert!(!masked.to_lowercase().contains("rust"));
        assert!(masked.contains("work"));
    }
}
