/// Recall subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum RecallError {
    #[error("primary search failed: {reason}")]
    SearchFailed { reason: String },

    #[error("recall limit {limit} exceeds maximum {maximum}")]
    LimitTooLarge { limit: usize, maximum: usize },
}
