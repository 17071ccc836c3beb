//! Hybrid merger: combines lexical and semantic result sets into one
//! ranked, de-duplicated list.
//!
//! Lexical results are rank-normalized into [0,1] (the i-th of N gets
//! `1 - i/N`); semantic results carry raw cosine similarity. The merge is a
//! deterministic, order-independent reduction keyed by prompt id, so the
//! outcome does not depend on which search finished first.

use std::collections::HashMap;

use crate::core::model::{Prompt, SearchResult, SearchType};

/// Default result limit for hybrid queries.
pub const DEFAULT_LIMIT: usize = 10;

/// Relative weights of the two score sources.
#[derive(Debug, Clone, Copy)]
pub struct HybridWeights {
    pub fts: f64,
    pub semantic: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            fts: 0.6,
            semantic: 0.4,
        }
    }
}

struct Accumulator {
    prompt: Prompt,
    fts_score: f64,
    semantic_score: f64,
    in_fts: bool,
    in_semantic: bool,
}

/// Merge lexical and semantic result sets. A prompt present in both is
/// combined into one entry tagged `hybrid`.
pub fn merge(
    lexical: Vec<(Prompt, f64)>,
    semantic: Vec<(Prompt, f32)>,
    weights: HybridWeights,
    limit: usize,
) -> Vec<SearchResult> {
    let mut by_id: HashMap<String, Accumulator> = HashMap::new();

    let total = lexical.len();
    for (i, (prompt, _score)) in lexical.into_iter().enumerate() {
        let normalized = 1.0 - (i as f64 / total as f64);
        by_id.insert(
            prompt.id.clone(),
            Accumulator {
                prompt,
                fts_score: normalized,
                semantic_score: 0.0,
                in_fts: true,
                in_semantic: false,
            },
        );
    }

    for (prompt, similarity) in semantic {
        match by_id.get_mut(&prompt.id) {
            Some(entry) => {
                entry.semantic_score = similarity as f64;
                entry.in_semantic = true;
            }
            None => {
                by_id.insert(
                    prompt.id.clone(),
                    Accumulator {
                        prompt,
                        fts_score: 0.0,
                        semantic_score: similarity as f64,
                        in_fts: false,
                        in_semantic: true,
                    },
                );
            }
        }
    }

    let mut results: Vec<SearchResult> = by_id
        .into_values()
        .map(|acc| {
            let hybrid_score = acc.fts_score * weights.fts + acc.semantic_score * weights.semantic;
            let search_type = match (acc.in_fts, acc.in_semantic) {
                (true, true) => SearchType::Hybrid,
                (true, false) => SearchType::Fts,
                _ => SearchType::Semantic,
            };
            SearchResult {
                prompt: acc.prompt,
                search_type,
                fts_score: acc.fts_score,
                semantic_score: acc.semantic_score,
                hybrid_score,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.hybrid_score
            .partial_cmp(&a.hybrid_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.prompt.updated_at.cmp(&a.prompt.updated_at))
    });
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn prompt(id: &str) -> Prompt {
        Prompt {
            id: id.to_string(),
            title: format!("title {}", id),
            content: "content".to_string(),
            category: None,
            tags: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_rank_normalization() {
        let lexical = vec![(prompt("a"), 9.0), (prompt("b"), 5.0), (prompt("c"), 1.0)];
        let results = merge(lexical, Vec::new(), HybridWeights::default(), 10);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].prompt.id, "a");
        assert!((results[0].fts_score - 1.0).abs() < 1e-9);
        assert!((results[1].fts_score - (1.0 - 1.0 / 3.0)).abs() < 1e-9);
        assert!((results[2].fts_score - (1.0 - 2.0 / 3.0)).abs() < 1e-9);
        assert!(results.iter().all(|r| r.search_type == SearchType::Fts));
    }

    #[test]
    fn test_overlap_combines_into_hybrid() {
        let lexical = vec![(prompt("a"), 9.0), (prompt("b"), 5.0)];
        let semantic = vec![(prompt("a"), 0.9f32), (prompt("c"), 0.8f32)];

        let results = merge(lexical, semantic, HybridWeights::default(), 10);
        assert_eq!(results.len(), 3);

        let a = results.iter().find(|r| r.prompt.id == "a").expect("a");
        assert_eq!(a.search_type, SearchType::Hybrid);
        let expected = 1.0 * 0.6 + 0.9 * 0.4;
        assert!((a.hybrid_score - expected).abs() < 1e-6);

        let c = results.iter().find(|r| r.prompt.id == "c").expect("c");
        assert_eq!(c.search_type, SearchType::Semantic);
        assert_eq!(c.fts_score, 0.0);
    }

    #[test]
    fn test_ordering_and_limit() {
        let lexical = vec![(prompt("a"), 1.0)];
        let semantic = vec![(prompt("b"), 0.99f32), (prompt("c"), 0.1f32)];

        // fts weight 0 makes semantic dominance easy to assert.
        let weights = HybridWeights {
            fts: 0.0,
            semantic: 1.0,
        };
        let results = merge(lexical, semantic, weights, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].prompt.id, "b");
    }

    #[test]
    fn test_merge_is_order_independent() {
        let lexical = vec![(prompt("a"), 3.0), (prompt("b"), 2.0)];
        let semantic = vec![(prompt("b"), 0.5f32), (prompt("a"), 0.4f32)];

        let r1 = merge(lexical.clone(), semantic.clone(), HybridWeights::default(), 10);
        let r2 = merge(lexical, semantic, HybridWeights::default(), 10);

        let ids1: Vec<&str> = r1.iter().map(|r| r.prompt.id.as_str()).collect();
        let ids2: Vec<&str> = r2.iter().map(|r| r.prompt.id.as_str()).collect();
        assert_eq!(ids1, ids2);
    }
}
