//! Semantic search: brute-force cosine scan over stored embeddings.
//!
//! O(n) over the whole collection, which is fine at the target scale.

use crate::core::error::{PromptError, Result};
use crate::core::model::Prompt;
use crate::store::Store;

use super::embedding::{blob_to_embedding, cosine_similarity};

/// Rank every stored embedding against the query vector and return the top
/// `limit` prompts by descending similarity. A stored vector whose length
/// differs from the query's is a data-integrity fault and fails the whole
/// operation.
pub fn search(store: &Store, query_vector: &[f32], limit: usize) -> Result<Vec<(Prompt, f32)>> {
    let mut results: Vec<(Prompt, f32)> = Vec::new();

    for (prompt, blob) in store.load_embeddings()? {
        let stored = blob_to_embedding(&blob);
        if stored.len() != query_vector.len() {
            return Err(PromptError::DimensionMismatch {
                expected: query_vector.len(),
                actual: stored.len(),
            });
        }
        let similarity = cosine_similarity(query_vector, &stored);
        results.push((prompt, similarity));
    }

    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::PromptDraft;
    use crate::search::embedding::{embedding_to_blob, local_embedding, LOCAL_MODEL};

    fn seed(store: &Store, title: &str, content: &str) -> Prompt {
        let prompt = store
            .create_prompt(&PromptDraft {
                title: title.to_string(),
                content: content.to_string(),
                category: None,
                tags: Vec::new(),
            })
            .expect("seed prompt");
        let vector = local_embedding(&format!("{} {}", title, content));
        store
            .upsert_embedding(&prompt.id, &embedding_to_blob(&vector), LOCAL_MODEL)
            .expect("seed embedding");
        prompt
    }

    #[test]
    fn test_most_similar_first() -> Result<()> {
        let store = Store::open_in_memory()?;
        let target = seed(&store, "Socratic tutor", "socratic questioning teaching");
        seed(&store, "Budget sheet", "quarterly numbers spreadsheet");

        let query = local_embedding("socratic questioning");
        let results = search(&store, &query, 10)?;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, target.id);
        assert!(results[0].1 > results[1].1);
        Ok(())
    }

    #[test]
    fn test_limit_truncates() -> Result<()> {
        let store = Store::open_in_memory()?;
        for i in 0..5 {
            seed(&store, &format!("P{}", i), "some shared words here");
        }

        let query = local_embedding("shared words");
        let results = search(&store, &query, 3)?;
        assert_eq!(results.len(), 3);
        Ok(())
    }

    #[test]
    fn test_dimension_mismatch_fails() -> Result<()> {
        let store = Store::open_in_memory()?;
        let prompt = store.create_prompt(&PromptDraft {
            title: "Bad".to_string(),
            content: "vector".to_string(),
            category: None,
            tags: Vec::new(),
        })?;
        store.upsert_embedding(&prompt.id, &embedding_to_blob(&[1.0, 0.0]), "skewed")?;

        let query = local_embedding("anything");
        let err = search(&store, &query, 10).unwrap_err();
        assert!(matches!(err, PromptError::DimensionMismatch { .. }));
        Ok(())
    }

    #[test]
    fn test_empty_store_is_empty() -> Result<()> {
        let store = Store::open_in_memory()?;
        let query = local_embedding("anything");
        assert!(search(&store, &query, 10)?.is_empty());
        Ok(())
    }
}
