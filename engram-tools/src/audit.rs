//! Tool-call audit trail: a bounded queue drained by a background task.
//! The request path only ever pushes; when the queue is full the oldest
//! entry is dropped with a warning.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

const QUEUE_CAPACITY: usize = 1_024;
const DRAIN_INTERVAL_SECS: u64 = 1;

/// One audited tool invocation.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub at: DateTime<Utc>,
    pub user_id: Uuid,
    pub tool: String,
    pub outcome: String,
    pub detail: Option<String>,
}

/// Producer handle. Cloneable and cheap; never blocks.
#[derive(Clone)]
pub struct AuditLog {
    queue: Arc<Mutex<VecDeque<AuditRecord>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::with_capacity(QUEUE_CAPACITY))),
        }
    }

    /// Record a tool invocation. Drops the oldest entry when full.
    pub fn record(&self, user_id: Uuid, tool: &str, outcome: &str, detail: Option<String>) {
        let record = AuditRecord {
            at: Utc::now(),
            user_id,
            tool: tool.to_string(),
            outcome: outcome.to_string(),
            detail,
        };

        let Ok(mut queue) = self.queue.lock() else {
            return;
        };
        if queue.len() >= QUEUE_CAPACITY {
            queue.pop_front();
            warn!("audit queue full, dropped oldest entry");
        }
        queue.push_back(record);
    }

    /// Take everything currently queued.
    pub fn drain(&self) -> Vec<AuditRecord> {
        match self.queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Spawn the single consumer. Entries surface as structured log lines
    /// under the `audit` target until shutdown flips.
    pub fn spawn_drain(&self, mut shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        let log = self.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(DRAIN_INTERVAL_SECS));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        for record in log.drain() {
                            info!(
                                target: "audit",
                                user_id = %record.user_id,
                                tool = %record.tool,
                                outcome = %record.outcome,
                                detail = record.detail.as_deref().unwrap_or(""),
                                "tool call"
                            );
                        }
                    }
                    result = shutdown.changed() => {
                        if result.is_err() || *shutdown.borrow() {
                            // Final flush before exit.
                            for record in log.drain() {
                                info!(
                                    target: "audit",
                                    user_id = %record.user_id,
                                    tool = %record.tool,
                                    outcome = %record.outcome,
                                    "tool call"
                                );
                            }
                            break;
                        }
                    }
                }
            }
        })
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
