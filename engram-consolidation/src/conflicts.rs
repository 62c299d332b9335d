//! Conflict detection in the similarity band between duplicates and noise.

use std::collections::HashSet;

use engram_core::config::ConsolidationConfig;
use engram_core::models::{Claim, ClaimType, Conflict};
use engram_embeddings::cosine_similarity;

/// Pairs of preference claims in the conflict band
/// `(low, high]`. Claims merged away as non-canonical duplicates are
/// ineligible; their canonical carries their meaning.
pub fn find_conflicts(
    claims: &[Claim],
    embeddings: &[Vec<f32>],
    config: &ConsolidationConfig,
    merged_away: &HashSet<usize>,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for a in 0..claims.len() {
        if merged_away.contains(&a) {
            continue;
        }
        for b in (a + 1)..claims.len() {
            if merged_away.contains(&b) {
                continue;
            }
            if claims[a].claim_type != ClaimType::Preference
                || claims[b].claim_type != ClaimType::Preference
            {
                continue;
            }
            let similarity = cosine_similarity(&embeddings[a], &embeddings[b]);
            if similarity > config.conflict_threshold_low
                && similarity <= config.conflict_threshold_high
            {
                conflicts.push(Conflict { a, b, similarity });
            }
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::claim;

    #[test]
    fn only_preference_pairs_in_band_conflict() {
        let claims = vec![
            claim("I prefer tabs", ClaimType::Preference),
            claim("I prefer spaces", ClaimType::Preference),
            claim("The repo uses spaces", ClaimType::Fact),
        ];
        // 0 vs 1 at cos ≈ 0.707; 0 vs 2 identical (but 2 is a fact).
        let embeddings = vec![
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![1.0, 0.0],
        ];

        let conflicts = find_conflicts(
            &claims,
            &embeddings,
            &ConsolidationConfig::default(),
            &HashSet::new(),
        );
        assert_eq!(conflicts.len(), 1);
        assert_eq!((conflicts[0].a, conflicts[0].b), (0, 1));
    }

    #[test]
    fn merged_duplicates_are_skipped() {
        let claims = vec![
            claim("I prefer tabs", ClaimType::Preference),
            claim("I prefer spaces", ClaimType::Preference),
        ];
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 1.0]];
        let merged: HashSet<usize> = [1].into_iter().collect();

        let conflicts = find_conflicts(
            &claims,
            &embeddings,
            &ConsolidationConfig::default(),
            &merged,
        );
        assert!(conflicts.is_empty());
    }

    #[test]
    fn duplicates_above_the_band_do_not_conflict() {
        let claims = vec![
            claim("I prefer tabs", ClaimType::Preference),
            claim("I really prefer tabs", ClaimType::Preference),
        ];
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
        let conflicts = find_conflicts(
            &claims,
            &embeddings,
            &ConsolidationConfig::default(),
            &HashSet::new(),
        );
        assert!(conflicts.is_empty());
    }
}
