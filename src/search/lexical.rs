//! Lexical full-text search with custom relevance scoring.
//!
//! Candidates come from the FTS5 index; the final score is a weighted sum
//! computed here rather than the raw engine rank:
//!
//! - title substring match        weight 4
//! - tags substring match         weight 3 (when tags are indexed)
//! - content substring match      weight 2
//! - category substring match     weight 1
//! - recency                      -0.1 per day since last update
//! - 10x the engine's native rank (negated bm25, so better matches add more)

use chrono::Utc;

use crate::core::error::Result;
use crate::core::model::Prompt;
use crate::store::Store;

const WEIGHT_TITLE: f64 = 4.0;
const WEIGHT_TAGS: f64 = 3.0;
const WEIGHT_CONTENT: f64 = 2.0;
const WEIGHT_CATEGORY: f64 = 1.0;
const RECENCY_PER_DAY: f64 = -0.1;
const RANK_MULTIPLIER: f64 = 10.0;

/// Build an FTS5 match expression from a raw user query.
///
/// Tokens are double-quoted (embedded quotes doubled) so user input cannot
/// inject FTS syntax. The last token becomes a prefix match unless the raw
/// query already ends with a wildcard, so "soc" matches "socratic".
/// Returns `None` for an empty query.
pub fn build_match_expr(raw: &str, index_tags: bool) -> Option<String> {
    let trimmed = raw.trim();
    let tokens: Vec<&str> = trimmed
        .split_whitespace()
        .map(|t| t.trim_end_matches('*'))
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return None;
    }

    let last = tokens.len() - 1;
    let phrases: Vec<String> = tokens
        .iter()
        .enumerate()
        .map(|(i, tok)| {
            let quoted = format!("\"{}\"", tok.replace('"', "\"\""));
            if i == last {
                format!("{}*", quoted)
            } else {
                quoted
            }
        })
        .collect();

    let expr = phrases.join(" ");
    if index_tags {
        Some(expr)
    } else {
        // Tag-less schema variant: restrict matching to the other columns.
        Some(format!("{{title content category}} : ({})", expr))
    }
}

/// Run a lexical search. Returns `(prompt, score)` pairs ordered by
/// descending score, ties broken by most recent update. No match is an
/// empty list, not an error.
pub fn search(
    store: &Store,
    query: &str,
    category: Option<&str>,
    index_tags: bool,
) -> Result<Vec<(Prompt, f64)>> {
    let Some(match_expr) = build_match_expr(query, index_tags) else {
        return Ok(Vec::new());
    };

    let candidates = store.fts_candidates(&match_expr)?;
    let needle = query.trim().trim_end_matches('*').to_lowercase();
    let now = Utc::now();

    let mut scored: Vec<(Prompt, f64)> = candidates
        .into_iter()
        .filter(|(prompt, _)| match category {
            Some(cat) => prompt.category.as_deref() == Some(cat),
            None => true,
        })
        .map(|(prompt, rank)| {
            let score = relevance_score(&prompt, &needle, rank, index_tags, now);
            (prompt, score)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.0.updated_at.cmp(&a.0.updated_at))
    });

    Ok(scored)
}

fn relevance_score(
    prompt: &Prompt,
    needle: &str,
    rank: f64,
    index_tags: bool,
    now: chrono::DateTime<Utc>,
) -> f64 {
    let mut score = 0.0;

    if prompt.title.to_lowercase().contains(needle) {
        score += WEIGHT_TITLE;
    }
    if index_tags
        && prompt
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(needle))
    {
        score += WEIGHT_TAGS;
    }
    if prompt.content.to_lowercase().contains(needle) {
        score += WEIGHT_CONTENT;
    }
    if let Some(cat) = &prompt.category {
        if cat.to_lowercase().contains(needle) {
            score += WEIGHT_CATEGORY;
        }
    }

    let age_days = (now - prompt.updated_at).num_seconds() as f64 / 86_400.0;
    score += age_days * RECENCY_PER_DAY;

    // FTS5 rank is negative bm25: more negative means more relevant.
    score += RANK_MULTIPLIER * -rank;

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::PromptDraft;

    fn seed(store: &Store, title: &str, content: &str, category: Option<&str>, tags: &[&str]) {
        store
            .create_prompt(&PromptDraft {
                title: title.to_string(),
                content: content.to_string(),
                category: category.map(String::from),
                tags: tags.iter().map(|t| t.to_string()).collect(),
            })
            .expect("seed prompt");
    }

    #[test]
    fn test_build_match_expr() {
        assert_eq!(build_match_expr("soc", true).as_deref(), Some("\"soc\"*"));
        assert_eq!(
            build_match_expr("java script", true).as_deref(),
            Some("\"java\" \"script\"*")
        );
        // Existing wildcard is not doubled.
        assert_eq!(build_match_expr("soc*", true).as_deref(), Some("\"soc\"*"));
        assert_eq!(build_match_expr("  ", true), None);
        // Embedded quotes are neutralized.
        assert_eq!(
            build_match_expr("a\"b", true).as_deref(),
            Some("\"a\"\"b\"*")
        );
    }

    #[test]
    fn test_build_match_expr_tagless_variant() {
        assert_eq!(
            build_match_expr("soc", false).as_deref(),
            Some("{title content category} : (\"soc\"*)")
        );
    }

    #[test]
    fn test_prefix_matches_last_token() -> Result<()> {
        let store = Store::open_in_memory()?;
        seed(&store, "Socratic tutor", "Ask questions", None, &[]);

        let results = search(&store, "soc", None, true)?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.title, "Socratic tutor");
        Ok(())
    }

    #[test]
    fn test_title_match_outranks_content_match() -> Result<()> {
        let store = Store::open_in_memory()?;
        seed(&store, "JavaScript snippets", "handy utilities", None, &[]);
        seed(
            &store,
            "Daily journal",
            "notes about learning JavaScript",
            None,
            &[],
        );

        let results = search(&store, "JavaScript", None, true)?;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.title, "JavaScript snippets");
        assert!(results[0].1 > results[1].1);
        Ok(())
    }

    #[test]
    fn test_category_filter_is_exact() -> Result<()> {
        let store = Store::open_in_memory()?;
        seed(&store, "Review A", "review code", Some("dev"), &[]);
        seed(&store, "Review B", "review prose", Some("writing"), &[]);

        let results = search(&store, "review", Some("dev"), true)?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.category.as_deref(), Some("dev"));
        Ok(())
    }

    #[test]
    fn test_no_match_is_empty() -> Result<()> {
        let store = Store::open_in_memory()?;
        seed(&store, "A", "b", None, &[]);

        assert!(search(&store, "zebra", None, true)?.is_empty());
        assert!(search(&store, "", None, true)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_tag_match_scores() -> Result<()> {
        let store = Store::open_in_memory()?;
        seed(&store, "Untitled", "nothing here", None, &["socratic"]);

        let with_tags = search(&store, "socratic", None, true)?;
        assert_eq!(with_tags.len(), 1);

        // Tag-less variant does not see the tag column.
        let without_tags = search(&store, "socratic", None, false)?;
        assert!(without_tags.is_empty());
        Ok(())
    }
}
