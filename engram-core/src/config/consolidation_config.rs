use crate::errors::{EngramError, EngramResult};

/// Thresholds driving the consolidation pipeline.
#[derive(Debug, Clone)]
pub struct ConsolidationConfig {
    /// Claims at or above this cosine similarity are grouped as duplicates.
    pub duplicate_threshold: f64,
    /// Conflict band lower bound (exclusive).
    pub conflict_threshold_low: f64,
    /// Conflict band upper bound (inclusive).
    pub conflict_threshold_high: f64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: 0.85,
            conflict_threshold_low: 0.5,
            conflict_threshold_high: 0.85,
        }
    }
}

impl ConsolidationConfig {
    pub fn validate(&self) -> EngramResult<()> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(self.duplicate_threshold)
            || !in_unit(self.conflict_threshold_low)
            || !in_unit(self.conflict_threshold_high)
            || self.conflict_threshold_low >= self.conflict_threshold_high
        {
            return Err(EngramError::Config {
                message: format!(
                    "invalid consolidation thresholds: dup {} conflict [{}, {}]",
                    self.duplicate_threshold,
                    self.conflict_threshold_low,
                    self.conflict_threshold_high
                ),
            });
        }
        Ok(())
    }
}
