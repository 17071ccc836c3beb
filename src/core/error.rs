//! Typed error taxonomy for the library surface.
//!
//! Identifier-resolution and version errors propagate to callers so a thin
//! transport layer can map them onto status codes. External-service failures
//! never appear here: the embedding and suggestion clients absorb them and
//! substitute fallbacks.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    /// Empty or malformed input, rejected before any store access.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Identifier (full or prefix) matched no prompt.
    #[error("prompt not found: {0}")]
    NotFound(String),

    /// Identifier prefix matched more than one prompt.
    #[error("ambiguous id prefix '{0}' matches multiple prompts")]
    Ambiguous(String),

    /// Requested version number does not exist for the prompt.
    #[error("version {version} not found for prompt {prompt_id}")]
    VersionNotFound { prompt_id: String, version: i64 },

    /// Stored and query embeddings have incompatible lengths. Indicates
    /// model skew in the store; a data-integrity fault, not a user error.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Category name collision on create.
    #[error("category already exists: {0}")]
    DuplicateCategory(String),

    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PromptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PromptError::Ambiguous("ab".to_string());
        assert_eq!(
            err.to_string(),
            "ambiguous id prefix 'ab' matches multiple prompts"
        );

        let err = PromptError::VersionNotFound {
            prompt_id: "x".to_string(),
            version: 3,
        };
        assert!(err.to_string().contains("version 3"));
    }
}
