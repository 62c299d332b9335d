//! LlmClient — retry, prompt composition, and response parsing behind the
//! `ILanguageModel` trait.

use std::str::FromStr;

use serde::Deserialize;
use tracing::{info, warn};

use engram_core::config::EngramConfig;
use engram_core::errors::{EngramResult, LlmError};
use engram_core::graph::EdgeType;
use engram_core::models::{Claim, ClaimType, ConflictResolution, EntityRelationship};
use engram_core::retry::RetryPolicy;
use engram_core::traits::{Classification, DraftExtraction, ILanguageModel};
use engram_core::validate;
use engram_core::EngramError;

use crate::extract::extract_json;
use crate::prompts;
use crate::providers::{self, ChatProvider, CompletionRequest};

/// The main language-model client. One chat provider, exponential backoff
/// on transient failures, strict parsing into the closed-set types.
pub struct LlmClient {
    provider: Box<dyn ChatProvider>,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(config: &EngramConfig) -> EngramResult<Self> {
        Ok(Self::with_provider(providers::create_provider(config)?))
    }

    /// Wrap an explicit provider (tests inject scripted ones here).
    pub fn with_provider(provider: Box<dyn ChatProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
        }
    }

    async fn complete(&self, request: CompletionRequest) -> EngramResult<String> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.provider.complete(&request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "LLM request failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[derive(Deserialize)]
struct RawClaim {
    #[serde(default)]
    claim: String,
    #[serde(default = "default_source")]
    source: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default)]
    claim_type: Option<String>,
    #[serde(default)]
    entities: Vec<String>,
    #[serde(default)]
    importance: Option<i64>,
}

fn default_source() -> String {
    "transcript".to_string()
}

fn default_confidence() -> f64 {
    0.8
}

#[derive(Deserialize)]
struct RawResolution {
    #[serde(default)]
    resolution: Option<String>,
    #[serde(default = "default_true")]
    is_real_conflict: bool,
    #[serde(default)]
    evolved_memory: Option<String>,
    #[serde(default = "default_resolution_confidence")]
    confidence: f64,
}

fn default_true() -> bool {
    true
}

fn default_resolution_confidence() -> f64 {
    0.7
}

#[derive(Deserialize)]
struct RawRelationship {
    #[serde(default)]
    from_entity: String,
    #[serde(default)]
    to_entity: String,
    #[serde(default)]
    relationship_type: Option<String>,
    #[serde(default = "default_resolution_confidence")]
    confidence: f64,
}

#[derive(Deserialize)]
struct RawContradiction {
    #[serde(default)]
    contradicts: bool,
}

#[derive(Deserialize)]
struct RawClassification {
    #[serde(default)]
    memory_type: Option<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Deserialize)]
struct RawTimelineInsights {
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    insights: Vec<String>,
}

#[derive(Deserialize)]
struct RawListenerExtraction {
    #[serde(default)]
    content: Option<String>,
    #[serde(default = "default_listener_role")]
    role: String,
    #[serde(default)]
    reason: Option<String>,
}

fn default_listener_role() -> String {
    "user".to_string()
}

/// Map a loose relationship-type string onto the closed edge-type set.
fn parse_edge_type(s: Option<&str>) -> EdgeType {
    s.and_then(|v| EdgeType::from_str(v).ok())
        .unwrap_or(EdgeType::RelatedTo)
}

#[async_trait::async_trait]
impl ILanguageModel for LlmClient {
    async fn extract_claims(&self, transcript: &str) -> EngramResult<Vec<Claim>> {
        let request = CompletionRequest::new(prompts::claim_extraction(transcript))
            .with_system(prompts::CLAIM_EXTRACTION_SYSTEM)
            .with_max_tokens(4096)
            .with_temperature(0.3);
        let response = self.complete(request).await?;

        let raw: Vec<RawClaim> = extract_json(&response).ok_or_else(|| {
            EngramError::Llm(LlmError::MalformedResponse {
                reason: format!("claims not valid JSON: {}", truncate(&response, 120)),
            })
        })?;

        let mut claims: Vec<Claim> = raw
            .into_iter()
            .filter(|c| !c.claim.trim().is_empty())
            .map(|c| {
                // Unknown claim-type strings degrade to plain facts; the
                // closed set is enforced here, not downstream.
                let claim_type = c
                    .claim_type
                    .as_deref()
                    .and_then(|t| ClaimType::from_str(t).ok())
                    .unwrap_or(ClaimType::Fact);
                let importance = match c.importance {
                    Some(value) => validate::clamp_importance(value as i32),
                    None => {
                        let mut base = (c.confidence * 10.0) as i32;
                        if claim_type == ClaimType::Preference {
                            base += 2;
                        }
                        validate::clamp_importance(base)
                    }
                };
                let mut entities = c.entities;
                entities.truncate(engram_core::constants::MAX_CLAIM_ENTITIES);
                Claim {
                    text: c.claim.trim().to_string(),
                    source: c.source,
                    confidence: validate::clamp_unit(c.confidence),
                    claim_type,
                    entities,
                    importance,
                }
            })
            .collect();

        claims.sort_by(|a, b| b.importance.cmp(&a.importance));
        info!(count = claims.len(), "claims extracted");
        Ok(claims)
    }

    async fn resolve_conflict(
        &self,
        statement_a: &str,
        statement_b: &str,
        similarity: f64,
    ) -> EngramResult<ConflictResolution> {
        let request =
            CompletionRequest::new(prompts::conflict_resolution(statement_a, statement_b, similarity))
                .with_system(prompts::CONFLICT_SYSTEM)
                .with_max_tokens(1024)
                .with_temperature(0.3);
        let response = self.complete(request).await?;

        match extract_json::<RawResolution>(&response) {
            Some(raw) => Ok(ConflictResolution {
                resolution: raw
                    .resolution
                    .unwrap_or_else(|| "Could not resolve".to_string()),
                is_real_conflict: raw.is_real_conflict,
                evolved: raw.evolved_memory.filter(|s| !s.trim().is_empty()),
                confidence: validate::clamp_unit(raw.confidence),
            }),
            None => {
                warn!("conflict resolution reply was not parseable, keeping both statements");
                Ok(ConflictResolution {
                    resolution: "Could not automatically resolve this conflict".to_string(),
                    is_real_conflict: true,
                    evolved: None,
                    confidence: 0.5,
                })
            }
        }
    }

    async fn check_contradiction(
        &self,
        statement_a: &str,
        statement_b: &str,
    ) -> EngramResult<bool> {
        let request = CompletionRequest::new(prompts::contradiction_check(statement_a, statement_b))
            .with_system(prompts::CONFLICT_SYSTEM)
            .with_max_tokens(256)
            .with_temperature(0.2);
        let response = self.complete(request).await?;

        // A conservative parse: an unreadable answer means "no conflict",
        // which routes the write down the plain-insert path.
        Ok(extract_json::<RawContradiction>(&response)
            .map(|r| r.contradicts)
            .unwrap_or(false))
    }

    async fn extract_entities(&self, text: &str) -> EngramResult<Vec<String>> {
        let request = CompletionRequest::new(prompts::entity_extraction(text))
            .with_system(prompts::ENTITY_SYSTEM)
            .with_max_tokens(512)
            .with_temperature(0.2);
        let response = self.complete(request).await?;
        Ok(extract_json::<Vec<String>>(&response).unwrap_or_default())
    }

    async fn infer_relationships(
        &self,
        claims: &[Claim],
        entities: &[String],
    ) -> EngramResult<Vec<EntityRelationship>> {
        if entities.len() < 2 {
            return Ok(vec![]);
        }

        let claims_text = claims
            .iter()
            .map(|c| format!("- {}", c.text))
            .collect::<Vec<_>>()
            .join("\n");
        let entities_text = entities.join(", ");

        let request =
            CompletionRequest::new(prompts::relationship_inference(&claims_text, &entities_text))
                .with_system(prompts::RELATIONSHIP_SYSTEM)
                .with_max_tokens(1024)
                .with_temperature(0.3);
        let response = self.complete(request).await?;

        let raw: Vec<RawRelationship> = extract_json(&response).unwrap_or_default();
        Ok(raw
            .into_iter()
            .filter(|r| !r.from_entity.is_empty() && !r.to_entity.is_empty())
            .map(|r| EntityRelationship {
                from_entity: r.from_entity,
                to_entity: r.to_entity,
                edge_type: parse_edge_type(r.relationship_type.as_deref()),
                confidence: validate::clamp_unit(r.confidence),
            })
            .collect())
    }

    async fn detect_patterns(&self, claims: &[Claim]) -> EngramResult<Vec<String>> {
        if claims.is_empty() {
            return Ok(vec![]);
        }
        let claims_text = claims
            .iter()
            .map(|c| format!("- {} (type: {:?})", c.text, c.claim_type))
            .collect::<Vec<_>>()
            .join("\n");

        let request = CompletionRequest::new(prompts::pattern_detection(&claims_text))
            .with_system(prompts::PATTERN_SYSTEM)
            .with_max_tokens(512)
            .with_temperature(0.5);
        let response = self.complete(request).await?;
        Ok(extract_json::<Vec<String>>(&response).unwrap_or_default())
    }

    async fn classify_content(
        &self,
        content: &str,
        known_domains: &[String],
        known_categories: &[String],
    ) -> EngramResult<Classification> {
        let request = CompletionRequest::new(prompts::content_classification(
            content,
            known_domains,
            known_categories,
        ))
        .with_system(prompts::CLASSIFICATION_SYSTEM)
        .with_max_tokens(256)
        .with_temperature(0.2);
        let response = self.complete(request).await?;

        let raw: RawClassification = extract_json(&response).ok_or_else(|| {
            EngramError::Llm(LlmError::MalformedResponse {
                reason: format!("classification not valid JSON: {}", truncate(&response, 120)),
            })
        })?;

        Ok(Classification {
            memory_type: raw
                .memory_type
                .as_deref()
                .and_then(|t| engram_core::memory::MemoryType::from_str(t).ok()),
            domain: raw.domain.filter(|d| !d.trim().is_empty()),
            category: raw.category.filter(|c| !c.trim().is_empty()),
        })
    }

    async fn timeline_insights(
        &self,
        entity_name: &str,
        timeline: &str,
    ) -> EngramResult<(Vec<String>, Vec<String>)> {
        let request = CompletionRequest::new(prompts::timeline_insights(entity_name, timeline))
            .with_system(prompts::TIMELINE_SYSTEM)
            .with_max_tokens(512)
            .with_temperature(0.5);
        let response = self.complete(request).await?;
        let raw: RawTimelineInsights = extract_json(&response).unwrap_or(RawTimelineInsights {
            patterns: vec![],
            insights: vec![],
        });
        Ok((raw.patterns, raw.insights))
    }

    async fn extract_conversation_memories(
        &self,
        context: &str,
    ) -> EngramResult<Vec<DraftExtraction>> {
        let request = CompletionRequest::new(prompts::listener_extraction(context))
            .with_system(prompts::LISTENER_SYSTEM)
            .with_max_tokens(1024)
            .with_temperature(0.3);
        let response = self.complete(request).await?;

        let raw: Vec<RawListenerExtraction> = extract_json(&response).unwrap_or_default();
        Ok(raw
            .into_iter()
            .filter_map(|e| {
                let content = e.content?;
                if content.trim().is_empty() {
                    return None;
                }
                Some(DraftExtraction {
                    content,
                    role: e.role,
                    reason: e.reason,
                })
            })
            .collect())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    let end = s
        .char_indices()
        .nth(max)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted provider that replays canned responses in order.
    struct Scripted {
        responses: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().rev().map(String::from).collect()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChatProvider for Scripted {
        async fn complete(&self, _request: &CompletionRequest) -> EngramResult<String> {
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| "[]".to_string()))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn claims_parse_with_unknown_types_degrading_to_fact() {
        let client = LlmClient::with_provider(Box::new(Scripted::new(vec![
            r#"```json
[
  {"claim": "I love TypeScript", "source": "turn 1", "confidence": 0.9,
   "claim_type": "preference", "entities": ["TypeScript"], "importance": 9},
  {"claim": "The build uses webpack", "claim_type": "weird_type"}
]
```"#,
        ])));

        let claims = client.extract_claims("...").await.unwrap();
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].claim_type, ClaimType::Preference);
        assert_eq!(claims[0].importance, 9);
        assert_eq!(claims[1].claim_type, ClaimType::Fact);
    }

    #[tokio::test]
    async fn claim_importance_derives_from_confidence_when_missing() {
        let client = LlmClient::with_provider(Box::new(Scripted::new(vec![
            r#"[{"claim": "x", "confidence": 0.6, "claim_type": "preference"}]"#,
        ])));
        let claims = client.extract_claims("...").await.unwrap();
        // 0.6 * 10 + 2 for preference = 8.
        assert_eq!(claims[0].importance, 8);
    }

    #[tokio::test]
    async fn unreadable_contradiction_reply_means_no_conflict() {
        let client =
            LlmClient::with_provider(Box::new(Scripted::new(vec!["that's hard to say!"])));
        assert!(!client.check_contradiction("a", "b").await.unwrap());
    }

    #[tokio::test]
    async fn conflict_resolution_falls_back_on_garbage() {
        let client = LlmClient::with_provider(Box::new(Scripted::new(vec!["garbage"])));
        let resolution = client.resolve_conflict("a", "b", 0.7).await.unwrap();
        assert!(resolution.is_real_conflict);
        assert!(resolution.evolved.is_none());
        assert!((resolution.confidence - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn relationships_map_to_closed_edge_set() {
        let client = LlmClient::with_provider(Box::new(Scripted::new(vec![
            r#"[
              {"from_entity": "TypeScript", "to_entity": "JavaScript", "relationship_type": "related_to", "confidence": 0.9},
              {"from_entity": "User", "to_entity": "Docker", "relationship_type": "made_up", "confidence": 0.7}
            ]"#,
        ])));
        let claims = vec![];
        let entities = vec!["TypeScript".to_string(), "JavaScript".to_string()];
        let rels = client.infer_relationships(&claims, &entities).await.unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].edge_type, EdgeType::RelatedTo);
        // Unknown relationship strings degrade to related_to.
        assert_eq!(rels[1].edge_type, EdgeType::RelatedTo);
    }

    #[tokio::test]
    async fn fewer_than_two_entities_skips_the_call() {
        let client = LlmClient::with_provider(Box::new(Scripted::new(vec![])));
        let rels = client
            .infer_relationships(&[], &["solo".to_string()])
            .await
            .unwrap();
        assert!(rels.is_empty());
    }
}
