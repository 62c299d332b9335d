//! Recency/frequency boosting and the deterministic result ordering.

use chrono::{DateTime, Duration, Utc};

use engram_core::models::ScoredMemory;

/// Apply the access-pattern boosts in place:
/// +0.10 when accessed within 24 h, else +0.05 within 7 days;
/// +0.05 when the access count exceeds 10. Scores clamp at 1.0.
pub fn apply_recency_boost(candidates: &mut [ScoredMemory], now: DateTime<Utc>) {
    for candidate in candidates.iter_mut() {
        let mut boost = 0.0;

        if let Some(last_accessed) = candidate.memory.last_accessed {
            let age = now - last_accessed;
            if age < Duration::hours(24) {
                boost += 0.10;
            } else if age < Duration::days(7) {
                boost += 0.05;
            }
        }
        if candidate.memory.access_count > 10 {
            boost += 0.05;
        }

        candidate.similarity = (candidate.similarity + boost).min(1.0);
    }
}

/// Sort by boosted similarity descending; ties break by importance
/// descending, then last_accessed descending, then id ascending.
pub fn sort_candidates(candidates: &mut [ScoredMemory]) {
    candidates.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.memory.importance.cmp(&a.memory.importance))
            .then_with(|| b.memory.last_accessed.cmp(&a.memory.last_accessed))
            .then_with(|| a.memory.id.cmp(&b.memory.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::memory_named;
    use uuid::Uuid;

    fn scored(similarity: f64) -> ScoredMemory {
        ScoredMemory {
            memory: memory_named(Uuid::new_v4(), "m", vec![1.0, 0.0]),
            similarity,
        }
    }

    #[test]
    fn fresh_access_gets_the_full_boost() {
        let now = Utc::now();
        let mut candidates = vec![scored(0.5)];
        candidates[0].memory.last_accessed = Some(now - Duration::hours(1));
        apply_recency_boost(&mut candidates, now);
        assert!((candidates[0].similarity - 0.60).abs() < 1e-9);
    }

    #[test]
    fn week_old_access_gets_half() {
        let now = Utc::now();
        let mut candidates = vec![scored(0.5)];
        candidates[0].memory.last_accessed = Some(now - Duration::days(3));
        apply_recency_boost(&mut candidates, now);
        assert!((candidates[0].similarity - 0.55).abs() < 1e-9);
    }

    #[test]
    fn frequency_boost_stacks_and_clamps() {
        let now = Utc::now();
        let mut candidates = vec![scored(0.95)];
        candidates[0].memory.last_accessed = Some(now - Duration::minutes(5));
        candidates[0].memory.access_count = 11;
        apply_recency_boost(&mut candidates, now);
        assert!((candidates[0].similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ordering_uses_the_tie_break_chain() {
        let mut a = scored(0.8);
        a.memory.importance = 5;
        let mut b = scored(0.8);
        b.memory.importance = 9;
        let mut c = scored(0.9);
        c.memory.importance = 1;

        let mut candidates = vec![a, b, c];
        sort_candidates(&mut candidates);
        assert!((candidates[0].similarity - 0.9).abs() < 1e-9);
        assert_eq!(candidates[1].memory.importance, 9);
        assert_eq!(candidates[2].memory.importance, 5);
    }
}
