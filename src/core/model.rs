//! Domain types: prompts, version snapshots, categories, search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of a full (hyphenated UUID v4) prompt identifier.
pub const FULL_ID_LEN: usize = 36;

/// A stored prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a new prompt.
#[derive(Debug, Clone, Default)]
pub struct PromptDraft {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

/// Partial update to a prompt. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PromptPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl PromptPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.tags.is_none()
    }
}

/// Immutable snapshot of a prompt's state prior to a mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptVersion {
    pub id: String,
    pub prompt_id: String,
    pub version_number: i64,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub change_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A category label. Advisory only: prompts reference categories by name,
/// not by foreign key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Which underlying searches produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Fts,
    Semantic,
    Hybrid,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fts => "fts",
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Search result with per-source scores. Non-persistent; response shaping only.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub prompt: Prompt,
    pub search_type: SearchType,
    pub fts_score: f64,
    pub semantic_score: f64,
    pub hybrid_score: f64,
}

/// Normalize a tag list to its single in-memory form: trimmed, non-empty,
/// first occurrence wins. Storage encoding (JSON array) happens only at the
/// store boundary.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let trimmed = tag.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.iter().any(|t| t == trimmed) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Split a comma-delimited tag string into normalized tags. Accepts the
/// loose shapes seen in imports (delimited string or already-split list).
pub fn parse_tag_string(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags_dedup_and_trim() {
        let tags = normalize_tags(vec![" rust ", "cli", "rust", "", "  "]);
        assert_eq!(tags, vec!["rust", "cli"]);
    }

    #[test]
    fn test_parse_tag_string() {
        let tags = parse_tag_string("writing, socratic , writing,");
        assert_eq!(tags, vec!["writing", "socratic"]);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(PromptPatch::default().is_empty());

        let patch = PromptPatch {
            content: Some("new".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
