mod consolidation_error;
mod embedding_error;
mod engram_error;
mod llm_error;
mod recall_error;
mod storage_error;

pub use consolidation_error::ConsolidationError;
pub use embedding_error::EmbeddingError;
pub use engram_error::{EngramError, EngramResult};
pub use llm_error::LlmError;
pub use recall_error::RecallError;
pub use storage_error::StorageError;
