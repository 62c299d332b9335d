/// Consolidation subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum ConsolidationError {
    #[error("transcript too short: {length} chars (minimum {minimum})")]
    TranscriptTooShort { length: usize, minimum: usize },

    #[error("transcript too long: {length} chars (maximum {maximum})")]
    TranscriptTooLong { length: usize, maximum: usize },

    #[error("consolidation already in progress for this user")]
    AlreadyRunning,

    #[error("persistence failed mid-batch: {reason}")]
    BatchFailed { reason: String },
}
