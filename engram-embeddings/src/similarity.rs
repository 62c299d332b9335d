//! Cosine similarity and the bounded pairwise duplicate sweep.

use rayon::prelude::*;

use engram_core::constants::PAIRWISE_SWEEP_CAP;

/// Cosine similarity between two vectors, in f64 for stable comparisons
/// against thresholds.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// All index pairs whose similarity reaches `threshold`, strongest first.
/// Bounded: only the first `PAIRWISE_SWEEP_CAP` vectors take part, which
/// keeps the CPU-bound stretch under the scheduling budget (callers batch
/// accordingly).
pub fn find_duplicate_pairs(
    embeddings: &[Vec<f32>],
    threshold: f64,
) -> Vec<(usize, usize, f64)> {
    let n = embeddings.len().min(PAIRWISE_SWEEP_CAP);
    if n < 2 {
        return vec![];
    }

    let mut pairs: Vec<(usize, usize, f64)> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            let embeddings = &embeddings[..n];
            (i + 1..n).filter_map(move |j| {
                let sim = cosine_similarity(&embeddings[i], &embeddings[j]);
                (sim >= threshold).then_some((i, j, sim))
            })
        })
        .collect();

    pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identical_vectors_pair_at_one() {
        let embeddings = vec![vec![0.6, 0.8], vec![0.6, 0.8], vec![-0.8, 0.6]];
        let pairs = find_duplicate_pairs(&embeddings, 0.95);
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].0, pairs[0].1), (0, 1));
        assert!((pairs[0].2 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn below_threshold_pairs_are_dropped() {
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert!(find_duplicate_pairs(&embeddings, 0.5).is_empty());
    }

    #[test]
    fn mismatched_lengths_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn sweep_is_capped() {
        let embeddings: Vec<Vec<f32>> = (0..60).map(|_| vec![1.0, 0.0]).collect();
        let pairs = find_duplicate_pairs(&embeddings, 0.99);
        // 50 capped vectors → C(50, 2) pairs at most.
        assert_eq!(pairs.len(), 50 * 49 / 2);
    }

    proptest! {
        #[test]
        fn cosine_stays_in_bounds(
            a in proptest::collection::vec(-10.0f32..10.0, 8),
            b in proptest::collection::vec(-10.0f32..10.0, 8),
        ) {
            let sim = cosine_similarity(&a, &b);
            prop_assert!((-1.0 - 1e-6..=1.0 + 1e-6).contains(&sim));
        }
    }
}
