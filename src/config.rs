//! Environment-driven configuration.

use std::path::PathBuf;

/// Default OpenAI-compatible API base for the external services.
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Runtime configuration, built once from the environment and passed in
/// explicitly so tests can construct isolated instances.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path.
    pub db_path: PathBuf,
    /// API key for the embedding/suggestion services. `None` means the
    /// local fallback embedder is used exclusively.
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Embedding model requested from the external service.
    pub embedding_model: String,
    /// Chat model used for improvement suggestions.
    pub suggestion_model: String,
    /// Whether lexical search matches against tags. Disable for stores
    /// whose prompts carry no tags.
    pub index_tags: bool,
}

impl Config {
    /// Build config from environment variables, with defaults.
    pub fn from_env() -> Self {
        let db_path = std::env::var("PROMPTKEEP_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_db_path());

        Self {
            db_path,
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            api_base: std::env::var("PROMPTKEEP_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            embedding_model: std::env::var("PROMPTKEEP_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            suggestion_model: std::env::var("PROMPTKEEP_SUGGESTION_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            index_tags: std::env::var("PROMPTKEEP_INDEX_TAGS")
                .map(|v| v != "0" && v.to_lowercase() != "false")
                .unwrap_or(true),
        }
    }

    /// Config for tests: in-memory-friendly, no external services.
    pub fn for_tests() -> Self {
        Self {
            db_path: PathBuf::from(":memory:"),
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            suggestion_model: "gpt-4o-mini".to_string(),
            index_tags: true,
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptkeep")
        .join("prompts.db")
}
