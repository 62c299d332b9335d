//! Tool: consolidate_session — turn a transcript into memories.

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use engram_core::EngramResult;

use crate::context::EngramContext;

#[derive(Debug, Clone, Deserialize)]
pub struct ConsolidateInput {
    pub session_transcript: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsolidateOutput {
    pub consolidation_id: Uuid,
    pub new_memories_count: usize,
    pub merged_count: usize,
    pub conflicts_resolved: usize,
    pub edges_created: usize,
    pub patterns_detected: Vec<String>,
    pub processing_time_ms: u64,
    pub status: String,
}

pub async fn consolidate_session(
    context: &EngramContext,
    user_id: Uuid,
    input: ConsolidateInput,
) -> EngramResult<ConsolidateOutput> {
    let result = context
        .consolidation
        .consolidate(user_id, &input.session_transcript, input.conversation_id)
        .await?;

    context.audit.record(
        user_id,
        "consolidate_session",
        result.status.as_str(),
        Some(format!("{} new memories", result.new_memories_count)),
    );

    Ok(ConsolidateOutput {
        consolidation_id: result.consolidation_id,
        new_memories_count: result.new_memories_count,
        merged_count: result.merged_count,
        conflicts_resolved: result.conflicts_resolved,
        edges_created: result.edges_created,
        patterns_detected: result.patterns_detected,
        processing_time_ms: result.processing_time_ms,
        status: result.status.as_str().to_string(),
    })
}

pub fn spec() -> serde_json::Value {
    json!({
        "name": "consolidate_session",
        "description": "Extract and store the important insights from a full conversation transcript: claims, duplicates merged, conflicts resolved, relationships mapped.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "session_transcript": {
                    "type": "string",
                    "minLength": 10,
                    "maxLength": 100000,
                    "description": "The full conversation transcript"
                },
                "conversation_id": {
                    "type": "string",
                    "description": "Optional conversation reference"
                }
            },
            "required": ["session_transcript"]
        }
    })
}
