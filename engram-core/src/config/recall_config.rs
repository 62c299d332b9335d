/// Recall pipeline tuning.
#[derive(Debug, Clone)]
pub struct RecallConfig {
    /// Soft deadline for the whole pipeline. When exceeded, remaining
    /// stages are skipped and the result is flagged partial.
    pub deadline_ms: u64,
    /// Synthetic similarity assigned to entity-expanded candidates.
    pub entity_expansion_similarity: f64,
    /// Synthetic similarity assigned to graph-expanded candidates.
    pub graph_expansion_similarity: f64,
    /// How many top residuals seed the graph expansion.
    pub graph_expansion_seeds: usize,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 5_000,
            entity_expansion_similarity: 0.5,
            graph_expansion_similarity: 0.4,
            graph_expansion_seeds: 3,
        }
    }
}
