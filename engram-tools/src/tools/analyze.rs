//! Tool: analyze_evolution — how an entity's story changed over time.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use engram_core::models::{DateRange, EvolutionEvent};
use engram_core::traits::{ILanguageModel, IMemoryStorage, MemoryListQuery};
use engram_core::{EngramError, EngramResult};

use crate::context::EngramContext;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeInput {
    #[serde(default)]
    pub entity_id: Option<Uuid>,
    #[serde(default)]
    pub entity_name: Option<String>,
    #[serde(default = "default_window")]
    pub time_window: String,
}

fn default_window() -> String {
    "all_time".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeOutput {
    pub entity_name: String,
    pub time_window: String,
    pub evolution_timeline: Vec<EvolutionEvent>,
    pub patterns: Vec<String>,
    pub insights: Vec<String>,
    pub related_entities: Vec<String>,
    pub total_mentions: usize,
    pub first_mentioned: Option<DateTime<Utc>>,
    pub last_mentioned: Option<DateTime<Utc>>,
}

pub async fn analyze_evolution(
    context: &EngramContext,
    user_id: Uuid,
    input: AnalyzeInput,
) -> EngramResult<AnalyzeOutput> {
    let window = DateRange::from_str(&input.time_window).unwrap_or(DateRange::AllTime);

    // A memory id resolves to its first entity.
    let entity_name = match (&input.entity_name, input.entity_id) {
        (Some(name), _) if !name.trim().is_empty() => name.clone(),
        (_, Some(memory_id)) => {
            let memory = context
                .storage
                .get(user_id, memory_id)?
                .ok_or_else(|| EngramError::not_found("memory", memory_id))?;
            memory
                .entities
                .first()
                .cloned()
                .ok_or_else(|| EngramError::validation("memory has no entities to analyze"))?
        }
        _ => {
            return Err(EngramError::validation(
                "either entity_id or entity_name must be provided",
            ))
        }
    };

    let timeline = context
        .graph
        .evolution_timeline(user_id, &entity_name, window)?;

    // Co-occurring entities across memories mentioning the target.
    let entity_lower = entity_name.to_lowercase();
    let all = context.storage.list_by_user(
        user_id,
        &MemoryListQuery {
            limit: 100,
            ..MemoryListQuery::default()
        },
    )?;
    let mut related: Vec<String> = Vec::new();
    for memory in &all {
        if memory
            .entities
            .iter()
            .any(|e| e.to_lowercase() == entity_lower)
        {
            for entity in &memory.entities {
                if entity.to_lowercase() != entity_lower && !related.contains(entity) {
                    related.push(entity.clone());
                }
            }
        }
    }
    related.truncate(10);

    // Model-generated reading of the timeline; the analysis degrades to
    // the raw timeline when the model is unavailable.
    let (patterns, insights) = if timeline.is_empty() {
        (vec![], vec![])
    } else {
        let rendered = timeline
            .iter()
            .take(10)
            .map(|event| {
                format!(
                    "- {}: {} ({:?})",
                    event.date.format("%Y-%m-%d"),
                    event.content_summary,
                    event.change
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        match context.llm.timeline_insights(&entity_name, &rendered).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "failed to generate timeline insights");
                (vec![], vec![])
            }
        }
    };

    context
        .audit
        .record(user_id, "analyze_evolution", "ok", Some(entity_name.clone()));

    info!(
        entity = %entity_name,
        total_mentions = timeline.len(),
        patterns_found = patterns.len(),
        "evolution analysis completed"
    );

    Ok(AnalyzeOutput {
        first_mentioned: timeline.first().map(|e| e.date),
        last_mentioned: timeline.last().map(|e| e.date),
        total_mentions: timeline.len(),
        entity_name,
        time_window: input.time_window,
        evolution_timeline: timeline,
        patterns,
        insights,
        related_entities: related,
    })
}

pub fn spec() -> serde_json::Value {
    json!({
        "name": "analyze_evolution",
        "description": "Track how an entity, preference, or concept evolved over time. Use this to understand how the user's preferences or knowledge changed.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "entity_id": {
                    "type": "string",
                    "format": "uuid",
                    "description": "UUID of a specific memory to track"
                },
                "entity_name": {
                    "type": "string",
                    "description": "Name of an entity to track (e.g. 'TypeScript', 'async/await')"
                },
                "time_window": {
                    "type": "string",
                    "enum": ["last_7_days", "last_30_days", "last_year", "all_time"],
                    "default": "all_time"
                }
            }
        }
    })
}
