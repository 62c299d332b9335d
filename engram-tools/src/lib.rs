//! # engram-tools
//!
//! The external surface of the Engram memory system: eight tool
//! operations with JSON schemas, the composition root that wires every
//! capability once, the audit queue, and the fail-open rate limiter.

pub mod audit;
pub mod context;
pub mod export;
pub mod rate_limit;
pub mod tools;

pub use context::EngramContext;

use engram_core::EngramError;

/// The transport-facing error payload: a stable kind, a human message,
/// and an optional retry hint in seconds.
pub fn error_payload(error: &EngramError) -> serde_json::Value {
    serde_json::json!({
        "kind": error.kind(),
        "message": error.to_string(),
        "retry_after": error.retry_after().map(|d| d.as_secs()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_kind_and_retry_hint() {
        let error = EngramError::Llm(engram_core::errors::LlmError::Unavailable {
            reason: "down".into(),
        });
        let payload = error_payload(&error);
        assert_eq!(payload["kind"], "upstream.llm");
        assert_eq!(payload["retry_after"], 10);

        let payload = error_payload(&EngramError::validation("nope"));
        assert_eq!(payload["kind"], "validation");
        assert!(payload["retry_after"].is_null());
    }
}
