//! Draft maturation: drafts ripen to active on accumulated evidence.

use engram_core::constants::{MATURATION_CONFIDENCE_THRESHOLD, MATURATION_EVIDENCE_EVENTS};
use engram_core::memory::Memory;

const EVENTS_KEY: &str = "maturation_events";
const CONFIDENCE_KEY: &str = "maturation_confidence";

/// Seed the maturation counters on a freshly created draft. Creation
/// counts as the first evidence event.
pub fn seed(memory: &mut Memory) {
    memory
        .metadata
        .insert(EVENTS_KEY.to_string(), "1".to_string());
    memory
        .metadata
        .insert(CONFIDENCE_KEY.to_string(), memory.confidence.to_string());
}

/// Record one consolidation into a draft: events + 1, accumulated
/// confidence + max(new_confidence × 0.2, 0.1). Returns true when the
/// draft has ripened.
pub fn apply_evidence(memory: &mut Memory, new_confidence: f64) -> bool {
    let events = read_u32(memory, EVENTS_KEY).unwrap_or(1) + 1;
    let accumulated = read_f64(memory, CONFIDENCE_KEY).unwrap_or(memory.confidence)
        + (new_confidence * 0.2).max(0.1);

    memory
        .metadata
        .insert(EVENTS_KEY.to_string(), events.to_string());
    memory
        .metadata
        .insert(CONFIDENCE_KEY.to_string(), accumulated.to_string());

    is_ripe(events, accumulated)
}

/// The ripening rule: at least three evidence events (including creation)
/// or accumulated confidence at the activation threshold.
pub fn is_ripe(events: u32, accumulated_confidence: f64) -> bool {
    events >= MATURATION_EVIDENCE_EVENTS
        || accumulated_confidence >= MATURATION_CONFIDENCE_THRESHOLD
}

fn read_u32(memory: &Memory, key: &str) -> Option<u32> {
    memory.metadata.get(key).and_then(|v| v.parse().ok())
}

fn read_f64(memory: &Memory, key: &str) -> Option<f64> {
    memory.metadata.get(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::memory_named;
    use uuid::Uuid;

    #[test]
    fn three_events_ripen_a_draft() {
        let mut draft = memory_named(Uuid::new_v4(), "draft", vec![1.0, 0.0]);
        draft.confidence = 0.3;
        seed(&mut draft);

        // Second event: 2 events, 0.3 + 0.1 = 0.4 accumulated. Not ripe.
        assert!(!apply_evidence(&mut draft, 0.3));
        // Third event ripens regardless of confidence.
        assert!(apply_evidence(&mut draft, 0.3));
    }

    #[test]
    fn high_confidence_ripens_early() {
        let mut draft = memory_named(Uuid::new_v4(), "draft", vec![1.0, 0.0]);
        draft.confidence = 0.5;
        seed(&mut draft);

        // 0.5 + max(0.9 × 0.2, 0.1) = 0.68 → not ripe yet... one more.
        assert!(!apply_evidence(&mut draft, 0.9));
        assert!(apply_evidence(&mut draft, 0.9));
    }

    #[test]
    fn evidence_floor_is_one_tenth() {
        let mut draft = memory_named(Uuid::new_v4(), "draft", vec![1.0, 0.0]);
        draft.confidence = 0.65;
        seed(&mut draft);

        // max(0.0 × 0.2, 0.1) = 0.1 → 0.75, still short of 0.8.
        assert!(!apply_evidence(&mut draft, 0.0));
        // Third event trips the event rule.
        assert!(apply_evidence(&mut draft, 0.0));
    }
}
