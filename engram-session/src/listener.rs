//! ShadowListener — background draft extraction from live conversations.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use engram_core::constants::THOUGHT_BUFFER_SWEEP_SECS;
use engram_core::memory::{MemorySource, MemoryStatus, NewMemory};
use engram_core::traits::ILanguageModel;
use engram_core::EngramResult;
use engram_processor::MemoryProcessor;

use crate::buffer::ThoughtBuffer;

/// Chunk endings that suggest a complete thought.
const RIPENESS_MARKERS: [char; 4] = ['?', '!', '.', '\n'];

/// Listens to conversation streams and turns stable stretches into draft
/// memories. Two chunks of the same conversation never race into
/// duplicate drafts: extraction holds a per-conversation mutex.
pub struct ShadowListener {
    processor: Arc<MemoryProcessor>,
    llm: Arc<dyn ILanguageModel>,
    buffer: Arc<ThoughtBuffer>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ShadowListener {
    pub fn new(processor: Arc<MemoryProcessor>, llm: Arc<dyn ILanguageModel>) -> Self {
        Self {
            processor,
            llm,
            buffer: Arc::new(ThoughtBuffer::new()),
            locks: DashMap::new(),
        }
    }

    pub fn buffer(&self) -> Arc<ThoughtBuffer> {
        self.buffer.clone()
    }

    /// Entry point for incoming conversation chunks. Returns the number of
    /// drafts created (zero when the buffer is not ripe yet).
    pub async fn listen(
        &self,
        user_id: Uuid,
        conversation_id: &str,
        role: &str,
        chunk: &str,
    ) -> EngramResult<usize> {
        self.buffer.add_chunk(conversation_id, role, chunk);

        if !is_ripe(chunk) {
            return Ok(0);
        }
        self.extract_drafts(user_id, conversation_id).await
    }

    /// Run extraction over the accumulated buffer under the conversation
    /// mutex.
    pub async fn extract_drafts(
        &self,
        user_id: Uuid,
        conversation_id: &str,
    ) -> EngramResult<usize> {
        let lock = self
            .locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let Some(context) = self.buffer.full_text(conversation_id) else {
            return Ok(0);
        };
        if context.is_empty() {
            return Ok(0);
        }

        debug!(conversation_id, "shadow listener running extraction");

        let extractions = match self.llm.extract_conversation_memories(&context).await {
            Ok(extractions) => extractions,
            Err(e) => {
                warn!(error = %e, "shadow extraction failed");
                return Ok(0);
            }
        };

        let mut created = 0usize;
        for extraction in extractions {
            if extraction.content.trim().is_empty() {
                continue;
            }
            let base_confidence = if extraction.role == "user" { 0.5 } else { 0.3 };

            let mut metadata = BTreeMap::new();
            metadata.insert("shadow_extracted".to_string(), "true".to_string());
            metadata.insert("extraction_role".to_string(), extraction.role.clone());
            metadata.insert(
                "original_context_tail".to_string(),
                tail(&context, 200).to_string(),
            );

            let new = NewMemory {
                content: extraction.content,
                memory_type: None,
                status: Some(MemoryStatus::Draft),
                entities: Vec::new(),
                domain: None,
                category: None,
                importance: None,
                confidence: Some(base_confidence),
                source: Some(MemorySource::Conversation),
                source_id: Some(conversation_id.to_string()),
                metadata,
                embedding: None,
            };

            let (memory, _) = self.processor.process_memory(user_id, new).await?;
            debug!(memory_id = %memory.id, "shadow listener created draft memory");
            created += 1;
        }

        self.buffer.clear(conversation_id);
        if created > 0 {
            info!(conversation_id, created, "shadow extraction complete");
        }
        Ok(created)
    }

    /// Spawn the TTL sweeper. It runs every 60 s until the shutdown signal
    /// flips, then exits cleanly.
    pub fn spawn_sweeper(&self, mut shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        let buffer = self.buffer.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(THOUGHT_BUFFER_SWEEP_SECS));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let evicted = buffer.sweep_stale(chrono::Utc::now());
                        for conversation_id in evicted {
                            debug!(conversation_id, "cleaned up stale thought buffer");
                        }
                    }
                    result = shutdown.changed() => {
                        if result.is_err() || *shutdown.borrow() {
                            debug!("thought buffer sweeper shutting down");
                            break;
                        }
                    }
                }
            }
        })
    }
}

/// A chunk is ripe when it is long enough and ends like a complete
/// sentence.
fn is_ripe(chunk: &str) -> bool {
    let trimmed = chunk.trim();
    trimmed.len() > 20 && trimmed.ends_with(RIPENESS_MARKERS)
}

fn tail(text: &str, max: usize) -> &str {
    let total = text.chars().count();
    if total <= max {
        return text;
    }
    let skip = total - max;
    let start = text
        .char_indices()
        .nth(skip)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &text[start..]
}
