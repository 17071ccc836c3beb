//! promptkeep library
//!
//! Personal prompt manager: CRUD with append-only version history and
//! hybrid (lexical + semantic) search over a local SQLite store.
//!
//! # Modules
//!
//! - `core`: domain types and the error taxonomy
//! - `store`: SQLite record store (FTS5, embeddings, cascading deletes)
//! - `search`: embedding provider, lexical/semantic engines, hybrid merger
//! - `service`: the exposed operation surface
//! - `suggest`: improvement suggestions with a heuristic fallback

pub mod config;
pub mod core;
pub mod search;
pub mod service;
pub mod store;
pub mod suggest;

// Re-exports for convenience
pub use config::Config;
pub use core::error::{PromptError, Result};
pub use core::model::{Category, Prompt, PromptDraft, PromptPatch, PromptVersion, SearchResult};
pub use search::{Embedder, HybridWeights};
pub use service::PromptService;
pub use store::Store;
