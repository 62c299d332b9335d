//! Per-conversation chunk accumulation with TTL eviction.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use engram_core::constants::THOUGHT_BUFFER_TTL_SECS;

#[derive(Debug, Clone)]
struct Chunk {
    role: String,
    content: String,
}

#[derive(Debug, Clone)]
struct ConversationBuffer {
    chunks: Vec<Chunk>,
    last_update: DateTime<Utc>,
}

/// Accumulates conversation chunks until extraction runs or the buffer
/// goes stale. Different conversations are fully independent.
pub struct ThoughtBuffer {
    buffers: DashMap<String, ConversationBuffer>,
    ttl: Duration,
}

impl ThoughtBuffer {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(THOUGHT_BUFFER_TTL_SECS as i64))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            buffers: DashMap::new(),
            ttl,
        }
    }

    pub fn add_chunk(&self, conversation_id: &str, role: &str, content: &str) {
        let mut entry = self
            .buffers
            .entry(conversation_id.to_string())
            .or_insert_with(|| ConversationBuffer {
                chunks: Vec::new(),
                last_update: Utc::now(),
            });
        entry.chunks.push(Chunk {
            role: role.to_string(),
            content: content.to_string(),
        });
        entry.last_update = Utc::now();
    }

    /// The accumulated conversation rendered as "ROLE: content" lines.
    pub fn full_text(&self, conversation_id: &str) -> Option<String> {
        self.buffers.get(conversation_id).map(|buffer| {
            buffer
                .chunks
                .iter()
                .map(|c| format!("{}: {}", c.role.to_uppercase(), c.content))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    pub fn clear(&self, conversation_id: &str) {
        self.buffers.remove(conversation_id);
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Drop buffers idle past the TTL. Returns the evicted conversation
    /// ids.
    pub fn sweep_stale(&self, now: DateTime<Utc>) -> Vec<String> {
        let stale: Vec<String> = self
            .buffers
            .iter()
            .filter(|entry| now - entry.value().last_update > self.ttl)
            .map(|entry| entry.key().clone())
            .collect();
        for id in &stale {
            self.buffers.remove(id);
        }
        stale
    }
}

impl Default for ThoughtBuffer {
    fn default() -> Self {
        Self::new()
    }
}
