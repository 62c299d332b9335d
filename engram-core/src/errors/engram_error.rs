use std::time::Duration;

use super::{ConsolidationError, EmbeddingError, LlmError, RecallError, StorageError};

/// Top-level error type for the Engram memory system.
/// All subsystem errors convert into this via `From` impls.
///
/// Every variant maps to a stable `kind` string that transport boundaries
/// expose to callers.
#[derive(Debug, thiserror::Error)]
pub enum EngramError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("language model error: {0}")]
    Llm(#[from] LlmError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("consolidation error: {0}")]
    Consolidation(#[from] ConsolidationError),

    #[error("recall error: {0}")]
    Recall(#[from] RecallError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("degraded mode: {component} using fallback: {fallback}")]
    Degraded { component: String, fallback: String },

    #[error("operation cancelled by client")]
    Cancelled,

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("internal invariant violated: {message}")]
    Internal { message: String },
}

impl EngramError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation { .. } => "validation",
            Self::Conflict { .. } => "conflict",
            Self::Llm(_) => "upstream.llm",
            Self::Embedding(_) => "upstream.embedding",
            Self::Storage(_) => "upstream.storage",
            Self::Consolidation(ConsolidationError::TranscriptTooShort { .. })
            | Self::Consolidation(ConsolidationError::TranscriptTooLong { .. }) => "validation",
            Self::Consolidation(ConsolidationError::AlreadyRunning) => "conflict",
            Self::Consolidation(_) => "internal",
            Self::Recall(RecallError::LimitTooLarge { .. }) => "validation",
            Self::Recall(_) => "internal",
            Self::Serialization(_) => "validation",
            Self::Degraded { .. } => "degraded",
            Self::Cancelled => "cancelled",
            Self::Config { .. } => "validation",
            Self::Internal { .. } => "internal",
        }
    }

    /// Suggested wait before retrying, for transient upstream failures.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Llm(_) | Self::Embedding(_) => Some(Duration::from_secs(10)),
            Self::Storage(StorageError::Sqlite { .. }) => Some(Duration::from_secs(1)),
            _ => None,
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Llm(LlmError::Unavailable { .. })
                | Self::Llm(LlmError::RequestFailed { .. })
                | Self::Embedding(EmbeddingError::Unavailable { .. })
                | Self::Embedding(EmbeddingError::RequestFailed { .. })
        )
    }
}

/// Convenience type alias.
pub type EngramResult<T> = Result<T, EngramError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable_strings() {
        assert_eq!(EngramError::not_found("memory", "x").kind(), "not_found");
        assert_eq!(EngramError::validation("bad").kind(), "validation");
        assert_eq!(
            EngramError::Llm(LlmError::Unavailable {
                reason: "down".into()
            })
            .kind(),
            "upstream.llm"
        );
        assert_eq!(
            EngramError::Consolidation(ConsolidationError::TranscriptTooShort {
                length: 9,
                minimum: 10
            })
            .kind(),
            "validation"
        );
        assert_eq!(EngramError::Cancelled.kind(), "cancelled");
    }

    #[test]
    fn upstream_errors_carry_retry_hint() {
        let err = EngramError::Embedding(EmbeddingError::Unavailable {
            reason: "timeout".into(),
        });
        assert!(err.retry_after().is_some());
        assert!(err.is_transient());
        assert!(EngramError::validation("x").retry_after().is_none());
    }
}
