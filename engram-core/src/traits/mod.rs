//! Capability traits. Engines receive these through an explicit
//! context; there is no global registry.

mod embedding;
mod language_model;
mod storage;

pub use embedding::IEmbeddingProvider;
pub use language_model::{Classification, DraftExtraction, ILanguageModel};
pub use storage::{
    CascadeDeletion, IEdgeStorage, IHistoryStorage, IHubStorage, IMemoryStorage, MemoryListQuery,
};
