//! Tool: refine_knowledge — correction and evolution of existing
//! knowledge. The old memory survives as superseded history.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use engram_core::memory::{Memory, MemoryStatus};
use engram_core::traits::{IEmbeddingProvider, IMemoryStorage};
use engram_core::{validate, EngramError, EngramResult};

use crate::context::EngramContext;

#[derive(Debug, Clone, Deserialize)]
pub struct RefineInput {
    pub memory_id: Uuid,
    pub new_content: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefineOutput {
    pub old_memory_id: Uuid,
    pub new_memory_id: Uuid,
    pub status: String,
}

pub async fn refine_knowledge(
    context: &EngramContext,
    user_id: Uuid,
    input: RefineInput,
) -> EngramResult<RefineOutput> {
    validate::content(&input.new_content)?;

    let old = context
        .storage
        .get(user_id, input.memory_id)?
        .filter(|m| m.status == MemoryStatus::Active)
        .ok_or_else(|| EngramError::not_found("memory", input.memory_id))?;

    info!(
        old_id = %old.id,
        new_content_len = input.new_content.len(),
        "refining memory"
    );

    // Re-extract entities for the corrected content; the refinement is a
    // deliberate replacement, so the write bypasses the dedup probe.
    let extraction = context
        .entities
        .extract_and_learn(user_id, &input.new_content)
        .await?;
    let embedding = context.embedder.embed(&input.new_content).await?;

    let now = Utc::now();
    let mut metadata = old.metadata.clone();
    metadata.insert("refined_from".to_string(), old.id.to_string());
    if let Some(reason) = &input.reason {
        metadata.insert("refinement_reason".to_string(), reason.clone());
    }

    let new_memory = Memory {
        id: Uuid::new_v4(),
        user_id,
        content_hash: Memory::hash_content(&input.new_content),
        content: input.new_content,
        memory_type: old.memory_type,
        status: MemoryStatus::Active,
        embedding: Some(embedding),
        entities: extraction.names(),
        domain: old.domain.clone(),
        category: old.category.clone(),
        importance: old.importance,
        confidence: old.confidence,
        source: old.source,
        source_id: old.source_id.clone(),
        metadata,
        superseded_by: None,
        access_count: 0,
        last_accessed: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    let links = context
        .entities
        .build_links(&new_memory, &new_memory.entities)?;
    context.storage.create_with_links(&new_memory, &links)?;

    context.graph.mark_superseded(
        user_id,
        old.id,
        new_memory.id,
        Some(
            input
                .reason
                .as_deref()
                .unwrap_or("Knowledge refinement/correction"),
        ),
    )?;
    context.cache.invalidate_user(user_id);

    context
        .audit
        .record(user_id, "refine_knowledge", "refined", None);
    info!(old_id = %old.id, new_id = %new_memory.id, "refinement complete");

    Ok(RefineOutput {
        old_memory_id: old.id,
        new_memory_id: new_memory.id,
        status: "refined".to_string(),
    })
}

pub fn spec() -> serde_json::Value {
    json!({
        "name": "refine_knowledge",
        "description": "Refines or corrects an existing memory. Use this instead of deleting when a misunderstanding occurred or information has evolved. The old memory is kept as superseded history.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "memory_id": {
                    "type": "string",
                    "format": "uuid",
                    "description": "The memory to refine (find it via recall first)"
                },
                "new_content": {
                    "type": "string",
                    "minLength": 1,
                    "maxLength": 8000,
                    "description": "The updated or corrected memory content"
                },
                "reason": {
                    "type": "string",
                    "description": "Optional reason for the refinement"
                }
            },
            "required": ["memory_id", "new_content"]
        }
    })
}
