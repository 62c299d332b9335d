//! Shared test doubles for the Engram workspace: a scripted language
//! model, a programmable embedder, and memory builders.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use engram_core::errors::{EngramResult, LlmError};
use engram_core::memory::{Memory, MemorySource, MemoryStatus, MemoryType};
use engram_core::models::{Claim, ConflictResolution, EntityRelationship};
use engram_core::traits::{Classification, DraftExtraction, IEmbeddingProvider, ILanguageModel};
use engram_core::EngramError;

/// Embedder with per-text programmed vectors and a deterministic hash
/// fallback. Identical text always embeds identically, so dedup paths are
/// exercisable without a remote provider.
pub struct ScriptedEmbedder {
    dimensions: usize,
    programmed: Mutex<HashMap<String, Vec<f32>>>,
}

impl ScriptedEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            programmed: Mutex::new(HashMap::new()),
        }
    }

    /// Pin the vector a given text embeds to. The vector is L2-normalised.
    pub fn program(&self, text: &str, vector: Vec<f32>) {
        assert_eq!(vector.len(), self.dimensions, "programmed vector width");
        self.programmed
            .lock()
            .unwrap()
            .insert(text.to_string(), normalize(vector));
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        if let Some(vector) = self.programmed.lock().unwrap().get(text) {
            return vector.clone();
        }
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let index =
                u64::from_le_bytes(bytes[0..8].try_into().unwrap()) as usize % self.dimensions;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }
        normalize(vector)
    }
}

fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

#[async_trait::async_trait]
impl IEmbeddingProvider for ScriptedEmbedder {
    async fn embed(&self, text: &str) -> EngramResult<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> EngramResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Language model with programmable task outcomes. Everything defaults to
/// the empty/neutral answer; tests set only what they exercise.
#[derive(Default)]
pub struct ScriptedLanguageModel {
    /// Queue of claim batches, one per `extract_claims` call.
    pub claims: Mutex<Vec<Vec<Claim>>>,
    /// Statement pairs that count as contradictions (matched when each
    /// statement contains one needle of a pair, in either order).
    pub contradiction_pairs: Mutex<Vec<(String, String)>>,
    /// Queue of conflict resolutions, one per `resolve_conflict` call.
    pub resolutions: Mutex<Vec<ConflictResolution>>,
    /// Entities returned for any `extract_entities` call.
    pub entities: Mutex<Vec<String>>,
    /// Relationships returned once, then empty.
    pub relationships: Mutex<Vec<EntityRelationship>>,
    pub patterns: Mutex<Vec<String>>,
    pub classification: Mutex<Option<Classification>>,
    pub draft_extractions: Mutex<Vec<DraftExtraction>>,
    /// When set, every task fails with an upstream LLM error.
    pub unavailable: std::sync::atomic::AtomicBool,
}

impl ScriptedLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_claims(&self, claims: Vec<Claim>) {
        self.claims.lock().unwrap().push(claims);
    }

    pub fn push_resolution(&self, resolution: ConflictResolution) {
        self.resolutions.lock().unwrap().push(resolution);
    }

    pub fn mark_contradictory(&self, a: &str, b: &str) {
        self.contradiction_pairs
            .lock()
            .unwrap()
            .push((a.to_string(), b.to_string()));
    }

    pub fn set_relationships(&self, relationships: Vec<EntityRelationship>) {
        *self.relationships.lock().unwrap() = relationships;
    }

    pub fn set_entities(&self, entities: Vec<String>) {
        *self.entities.lock().unwrap() = entities;
    }

    pub fn set_patterns(&self, patterns: Vec<String>) {
        *self.patterns.lock().unwrap() = patterns;
    }

    pub fn set_classification(&self, classification: Classification) {
        *self.classification.lock().unwrap() = Some(classification);
    }

    pub fn set_draft_extractions(&self, drafts: Vec<DraftExtraction>) {
        *self.draft_extractions.lock().unwrap() = drafts;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable
            .store(unavailable, std::sync::atomic::Ordering::SeqCst);
    }

    fn check_available(&self) -> EngramResult<()> {
        if self.unavailable.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(EngramError::Llm(LlmError::Unavailable {
                reason: "scripted outage".to_string(),
            }));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ILanguageModel for ScriptedLanguageModel {
    async fn extract_claims(&self, _transcript: &str) -> EngramResult<Vec<Claim>> {
        self.check_available()?;
        let mut queue = self.claims.lock().unwrap();
        if queue.is_empty() {
            Ok(vec![])
        } else {
            Ok(queue.remove(0))
        }
    }

    async fn resolve_conflict(
        &self,
        _statement_a: &str,
        _statement_b: &str,
        _similarity: f64,
    ) -> EngramResult<ConflictResolution> {
        self.check_available()?;
        let mut queue = self.resolutions.lock().unwrap();
        if queue.is_empty() {
            Ok(ConflictResolution {
                resolution: "no scripted resolution".to_string(),
                is_real_conflict: false,
                evolved: None,
                confidence: 0.5,
            })
        } else {
            Ok(queue.remove(0))
        }
    }

    async fn check_contradiction(
        &self,
        statement_a: &str,
        statement_b: &str,
    ) -> EngramResult<bool> {
        self.check_available()?;
        let pairs = self.contradiction_pairs.lock().unwrap();
        Ok(pairs.iter().any(|(a, b)| {
            (statement_a.contains(a.as_str()) && statement_b.contains(b.as_str()))
                || (statement_a.contains(b.as_str()) && statement_b.contains(a.as_str()))
        }))
    }

    async fn extract_entities(&self, _text: &str) -> EngramResult<Vec<String>> {
        self.check_available()?;
        Ok(self.entities.lock().unwrap().clone())
    }

    async fn infer_relationships(
        &self,
        _claims: &[Claim],
        _entities: &[String],
    ) -> EngramResult<Vec<EntityRelationship>> {
        self.check_available()?;
        Ok(std::mem::take(&mut *self.relationships.lock().unwrap()))
    }

    async fn detect_patterns(&self, _claims: &[Claim]) -> EngramResult<Vec<String>> {
        self.check_available()?;
        Ok(self.patterns.lock().unwrap().clone())
    }

    async fn classify_content(
        &self,
        _content: &str,
        _known_domains: &[String],
        _known_categories: &[String],
    ) -> EngramResult<Classification> {
        self.check_available()?;
        Ok(self
            .classification
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_default())
    }

    async fn timeline_insights(
        &self,
        _entity_name: &str,
        _timeline: &str,
    ) -> EngramResult<(Vec<String>, Vec<String>)> {
        self.check_available()?;
        Ok((self.patterns.lock().unwrap().clone(), vec![]))
    }

    async fn extract_conversation_memories(
        &self,
        _context: &str,
    ) -> EngramResult<Vec<DraftExtraction>> {
        self.check_available()?;
        Ok(self.draft_extractions.lock().unwrap().clone())
    }
}

/// Build an active memory owned by `user_id`, ready for direct insertion.
pub fn memory_named(user_id: Uuid, content: &str, embedding: Vec<f32>) -> Memory {
    Memory {
        id: Uuid::new_v4(),
        user_id,
        content: content.to_string(),
        memory_type: MemoryType::Semantic,
        status: MemoryStatus::Active,
        embedding: Some(embedding),
        entities: vec![],
        domain: None,
        category: None,
        importance: 5,
        confidence: 0.8,
        source: MemorySource::Manual,
        source_id: None,
        metadata: BTreeMap::new(),
        superseded_by: None,
        access_count: 0,
        last_accessed: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
        content_hash: Memory::hash_content(content),
    }
}

/// A claim with sensible defaults for consolidation tests.
pub fn claim(text: &str, claim_type: engram_core::models::ClaimType) -> Claim {
    Claim {
        text: text.to_string(),
        source: "transcript".to_string(),
        confidence: 0.8,
        claim_type,
        entities: vec![],
        importance: 6,
    }
}
