//! Entity hubs — the Zettelkasten index nodes connecting memories.

mod hub;

pub use hub::{
    EntityHub, EntitySource, ExtractedEntity, ExtractionResult, ExtractionTier, HubType,
    MemoryEntityLink, NewEntityHub,
};
