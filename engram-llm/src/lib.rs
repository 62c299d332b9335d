//! # engram-llm
//!
//! The generative language-model capability: provider adapters for
//! Anthropic and OpenAI chat endpoints, JSON extraction from model
//! output, and the typed task layer (`ILanguageModel`) the engines use.

pub mod client;
pub mod extract;
pub mod prompts;
pub mod providers;

pub use client::LlmClient;
pub use extract::extract_json;
pub use providers::{ChatProvider, CompletionRequest};
