//! `PromptService`: the exposed operation surface.
//!
//! Composes the record store, the embedding provider, the search engines
//! and the suggestion client. Write operations go through the version
//! history state machine in the store and then trigger an embedding
//! refresh as a detached background task: the caller gets its result
//! before the embedding necessarily exists, failures are logged and
//! counted, never surfaced. Lexical search indexes synchronously, so only
//! the semantic view has this eventual-consistency window.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::Config;
use crate::core::error::{PromptError, Result};
use crate::core::model::{Prompt, PromptDraft, PromptPatch, PromptVersion, SearchResult, SearchType};
use crate::search::embedding::embedding_to_blob;
use crate::search::{hybrid, lexical, semantic, Embedder, HybridWeights};
use crate::store::{Store, StoreStats};
use crate::suggest::{SuggestionClient, Suggestions};

/// Inter-item delay during bulk embedding regeneration, to respect
/// external-service rate limits.
const BULK_REGEN_DELAY: std::time::Duration = std::time::Duration::from_millis(200);

const DEFAULT_UPDATE_REASON: &str = "Updated prompt";

/// Outcome of a bulk embedding regeneration.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct RegenReport {
    pub successful: usize,
    pub failed: usize,
}

pub struct PromptService {
    store: Arc<Mutex<Store>>,
    embedder: Embedder,
    suggestions: SuggestionClient,
    index_tags: bool,
    background: Arc<Mutex<JoinSet<()>>>,
}

impl PromptService {
    /// Open the service against the configured database.
    pub fn new(config: &Config) -> Result<Self> {
        let store = if config.db_path.to_str() == Some(":memory:") {
            Store::open_in_memory()?
        } else {
            Store::open(&config.db_path)?
        };
        Ok(Self::with_parts(
            store,
            Embedder::new(config),
            SuggestionClient::new(config),
            config.index_tags,
        ))
    }

    /// Assemble from explicit parts (tests).
    pub fn with_parts(
        store: Store,
        embedder: Embedder,
        suggestions: SuggestionClient,
        index_tags: bool,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            embedder,
            suggestions,
            index_tags,
            background: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    // ===== Prompt CRUD + history =====

    pub async fn create_prompt(&self, draft: PromptDraft) -> Result<Prompt> {
        if draft.title.trim().is_empty() {
            return Err(PromptError::InvalidInput("title must not be empty".to_string()));
        }
        if draft.content.trim().is_empty() {
            return Err(PromptError::InvalidInput(
                "content must not be empty".to_string(),
            ));
        }

        let prompt = self.store.lock().await.create_prompt(&draft)?;
        self.spawn_embedding_refresh(prompt.clone()).await;
        Ok(prompt)
    }

    pub async fn get_prompt(&self, id_or_prefix: &str) -> Result<Prompt> {
        let store = self.store.lock().await;
        let id = store.resolve_id(id_or_prefix)?;
        store
            .get_prompt(&id)?
            .ok_or(PromptError::NotFound(id))
    }

    pub async fn list_prompts(&self, category: Option<&str>) -> Result<Vec<Prompt>> {
        self.store.lock().await.list_prompts(category)
    }

    pub async fn update_prompt(
        &self,
        id_or_prefix: &str,
        patch: PromptPatch,
        reason: Option<&str>,
    ) -> Result<Prompt> {
        if matches!(&patch.title, Some(t) if t.trim().is_empty()) {
            return Err(PromptError::InvalidInput("title must not be empty".to_string()));
        }
        if matches!(&patch.content, Some(c) if c.trim().is_empty()) {
            return Err(PromptError::InvalidInput(
                "content must not be empty".to_string(),
            ));
        }

        let updated = {
            let mut store = self.store.lock().await;
            let id = store.resolve_id(id_or_prefix)?;
            store.update_prompt(&id, &patch, reason.unwrap_or(DEFAULT_UPDATE_REASON))?
        };
        self.spawn_embedding_refresh(updated.clone()).await;
        Ok(updated)
    }

    pub async fn delete_prompt(&self, id_or_prefix: &str) -> Result<bool> {
        let store = self.store.lock().await;
        let id = store.resolve_id(id_or_prefix)?;
        store.delete_prompt(&id)
    }

    /// List version snapshots newest-first. A deleted or unknown prompt has
    /// an empty history (versions cascade with the prompt).
    pub async fn list_versions(&self, id_or_prefix: &str) -> Result<Vec<PromptVersion>> {
        let store = self.store.lock().await;
        match store.resolve_id(id_or_prefix) {
            Ok(id) => store.list_versions(&id),
            Err(PromptError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    pub async fn get_version(&self, id_or_prefix: &str, version_number: i64) -> Result<PromptVersion> {
        let store = self.store.lock().await;
        let id = store.resolve_id(id_or_prefix)?;
        store.get_version(&id, version_number)
    }

    pub async fn restore_version(
        &self,
        id_or_prefix: &str,
        version_number: i64,
        reason: Option<&str>,
    ) -> Result<Prompt> {
        let default_reason = format!("Restored to version {}", version_number);
        let restored = {
            let mut store = self.store.lock().await;
            let id = store.resolve_id(id_or_prefix)?;
            store.restore_version(&id, version_number, reason.unwrap_or(&default_reason))?
        };
        self.spawn_embedding_refresh(restored.clone()).await;
        Ok(restored)
    }

    // ===== Search =====

    /// Default search entry point: hybrid when embeddings exist, pure
    /// lexical otherwise.
    pub async fn search(&self, query: &str, category: Option<&str>) -> Result<Vec<SearchResult>> {
        self.hybrid_search(query, category, hybrid::DEFAULT_LIMIT, HybridWeights::default())
            .await
    }

    /// Lexical-only search; scores are the weighted relevance values.
    pub async fn lexical_search(
        &self,
        query: &str,
        category: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let store = self.store.lock().await;
        let ranked = lexical::search(&store, query, category, self.index_tags)?;
        Ok(ranked
            .into_iter()
            .map(|(prompt, score)| SearchResult {
                prompt,
                search_type: SearchType::Fts,
                fts_score: score,
                semantic_score: 0.0,
                hybrid_score: score,
            })
            .collect())
    }

    /// Semantic-only search over stored embeddings.
    pub async fn semantic_search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let (query_vector, _) = self.embedder.embed(query).await;
        let store = self.store.lock().await;
        let ranked = semantic::search(&store, &query_vector, limit)?;
        Ok(ranked
            .into_iter()
            .map(|(prompt, similarity)| SearchResult {
                prompt,
                search_type: SearchType::Semantic,
                fts_score: 0.0,
                semantic_score: similarity as f64,
                hybrid_score: similarity as f64,
            })
            .collect())
    }

    /// Hybrid search: lexical and semantic legs run concurrently, then the
    /// results are merged by id. With zero stored embeddings the semantic
    /// leg is skipped entirely and results stay tagged `fts`.
    pub async fn hybrid_search(
        &self,
        query: &str,
        category: Option<&str>,
        limit: usize,
        weights: HybridWeights,
    ) -> Result<Vec<SearchResult>> {
        let have_embeddings = self.store.lock().await.embedding_count()? > 0;

        if !have_embeddings {
            let store = self.store.lock().await;
            let ranked = lexical::search(&store, query, category, self.index_tags)?;
            return Ok(hybrid::merge(ranked, Vec::new(), weights, limit));
        }

        let (lexical_leg, semantic_leg) = tokio::join!(
            async {
                let store = self.store.lock().await;
                lexical::search(&store, query, category, self.index_tags)
            },
            async {
                let (query_vector, _) = self.embedder.embed(query).await;
                let store = self.store.lock().await;
                semantic::search(&store, &query_vector, limit)
            }
        );

        Ok(hybrid::merge(lexical_leg?, semantic_leg?, weights, limit))
    }

    // ===== Embeddings =====

    /// Regenerate one prompt's embedding synchronously.
    pub async fn regenerate_embedding(&self, id_or_prefix: &str) -> Result<()> {
        let prompt = self.get_prompt(id_or_prefix).await?;
        self.refresh_embedding(&prompt).await
    }

    /// Regenerate every prompt's embedding, sequentially with a small
    /// inter-item delay. One record failing does not abort the batch.
    pub async fn regenerate_all_embeddings(&self) -> Result<RegenReport> {
        let prompts = self.store.lock().await.list_prompts(None)?;
        let total = prompts.len();

        let mut successful = 0;
        let mut failed = 0;
        for (i, prompt) in prompts.into_iter().enumerate() {
            match self.refresh_embedding(&prompt).await {
                Ok(()) => successful += 1,
                Err(e) => {
                    warn!(prompt_id = %prompt.id, error = %e, "embedding regeneration failed");
                    failed += 1;
                }
            }
            if i + 1 < total {
                tokio::time::sleep(BULK_REGEN_DELAY).await;
            }
        }

        Ok(RegenReport { successful, failed })
    }

    async fn refresh_embedding(&self, prompt: &Prompt) -> Result<()> {
        let (vector, model) = self.embedder.embed(&embedding_text(prompt)).await;
        self.store
            .lock()
            .await
            .upsert_embedding(&prompt.id, &embedding_to_blob(&vector), &model)?;
        debug!(prompt_id = %prompt.id, model = %model, "embedding refreshed");
        Ok(())
    }

    /// Detached embedding refresh after a write. The triggering request
    /// completes without waiting; failures are logged.
    async fn spawn_embedding_refresh(&self, prompt: Prompt) {
        let store = Arc::clone(&self.store);
        let embedder = self.embedder.clone();

        self.background.lock().await.spawn(async move {
            let (vector, model) = embedder.embed(&embedding_text(&prompt)).await;
            let result = store
                .lock()
                .await
                .upsert_embedding(&prompt.id, &embedding_to_blob(&vector), &model);
            if let Err(e) = result {
                warn!(prompt_id = %prompt.id, error = %e, "background embedding refresh failed");
            }
        });
    }

    /// Wait for all pending background refreshes. The CLI drains before
    /// exiting; tests drain to close the eventual-consistency window.
    pub async fn drain_background(&self) {
        let mut set = self.background.lock().await;
        while set.join_next().await.is_some() {}
    }

    // ===== Suggestions / categories / stats =====

    pub async fn suggest_improvements(&self, id_or_prefix: &str) -> Result<Suggestions> {
        let prompt = self.get_prompt(id_or_prefix).await?;
        Ok(self
            .suggestions
            .suggest(&prompt.content, prompt.category.as_deref())
            .await)
    }

    pub async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<crate::core::model::Category> {
        self.store.lock().await.create_category(name, description)
    }

    pub async fn list_categories(&self) -> Result<Vec<crate::core::model::Category>> {
        self.store.lock().await.list_categories()
    }

    pub async fn delete_category(&self, name: &str) -> Result<bool> {
        self.store.lock().await.delete_category(name)
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.lock().await.stats()
    }
}

/// Text fed to the embedding provider for a prompt.
fn embedding_text(prompt: &Prompt) -> String {
    if prompt.tags.is_empty() {
        format!("{}\n{}", prompt.title, prompt.content)
    } else {
        format!("{}\n{}\n{}", prompt.title, prompt.content, prompt.tags.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PromptService {
        let store = Store::open_in_memory().expect("in-memory store");
        PromptService::with_parts(
            store,
            Embedder::local_only(),
            SuggestionClient::offline(),
            true,
        )
    }

    fn draft(title: &str, content: &str) -> PromptDraft {
        PromptDraft {
            title: title.to_string(),
            content: content.to_string(),
            category: None,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() -> Result<()> {
        let svc = service();
        let created = svc
            .create_prompt(PromptDraft {
                title: "Code Review".to_string(),
                content: "Review this diff".to_string(),
                category: Some("dev".to_string()),
                tags: vec!["review".to_string()],
            })
            .await?;

        let fetched = svc.get_prompt(&created.id).await?;
        assert_eq!(fetched.title, "Code Review");
        assert_eq!(fetched.content, "Review this diff");
        assert_eq!(fetched.category.as_deref(), Some("dev"));
        assert_eq!(fetched.tags, vec!["review"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_rejects_empty_fields() {
        let svc = service();
        assert!(matches!(
            svc.create_prompt(draft("", "content")).await,
            Err(PromptError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.create_prompt(draft("title", "  ")).await,
            Err(PromptError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_update_versions_and_default_reason() -> Result<()> {
        let svc = service();
        let prompt = svc.create_prompt(draft("VersionTest", "Original")).await?;

        let patch = PromptPatch {
            content: Some("Updated".to_string()),
            ..Default::default()
        };
        svc.update_prompt(&prompt.id, patch, None).await?;

        let versions = svc.list_versions(&prompt.id).await?;
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].content, "Original");
        assert_eq!(versions[0].change_reason.as_deref(), Some("Updated prompt"));
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_default_reason_and_live_state() -> Result<()> {
        let svc = service();
        let prompt = svc.create_prompt(draft("T", "first")).await?;
        let patch = PromptPatch {
            content: Some("second".to_string()),
            ..Default::default()
        };
        svc.update_prompt(&prompt.id, patch, None).await?;

        let restored = svc.restore_version(&prompt.id, 1, None).await?;
        assert_eq!(restored.content, "first");

        let versions = svc.list_versions(&prompt.id).await?;
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].content, "second");
        assert_eq!(
            versions[0].change_reason.as_deref(),
            Some("Restored to version 1")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_cascades_and_not_found() -> Result<()> {
        let svc = service();
        let prompt = svc.create_prompt(draft("T", "x")).await?;
        svc.drain_background().await;

        assert!(svc.delete_prompt(&prompt.id).await?);
        assert!(matches!(
            svc.get_prompt(&prompt.id).await,
            Err(PromptError::NotFound(_))
        ));
        assert!(svc.list_versions(&prompt.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_background_refresh_creates_embedding() -> Result<()> {
        let svc = service();
        svc.create_prompt(draft("T", "some content")).await?;

        svc.drain_background().await;
        assert_eq!(svc.stats().await?.embedding_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_hybrid_falls_back_to_lexical_without_embeddings() -> Result<()> {
        // Seed the store directly so no embedding refresh ever runs.
        let store = Store::open_in_memory()?;
        store.create_prompt(&draft("Socratic tutor", "ask questions"))?;
        store.create_prompt(&draft("Socratic index", "more questions"))?;
        let svc = PromptService::with_parts(
            store,
            Embedder::local_only(),
            SuggestionClient::offline(),
            true,
        );

        let hybrid_results = svc
            .hybrid_search("socratic", None, 10, HybridWeights::default())
            .await?;
        let lexical_results = svc.lexical_search("socratic", None).await?;

        assert_eq!(hybrid_results.len(), lexical_results.len());
        assert!(hybrid_results
            .iter()
            .all(|r| r.search_type == SearchType::Fts));
        let hybrid_ids: Vec<&str> = hybrid_results.iter().map(|r| r.prompt.id.as_str()).collect();
        let lexical_ids: Vec<&str> = lexical_results.iter().map(|r| r.prompt.id.as_str()).collect();
        assert_eq!(hybrid_ids, lexical_ids);
        Ok(())
    }

    #[tokio::test]
    async fn test_hybrid_tags_overlap_as_hybrid() -> Result<()> {
        let svc = service();
        svc.create_prompt(draft("Socratic tutor", "socratic questioning method"))
            .await?;
        svc.drain_background().await;

        let results = svc
            .hybrid_search("socratic", None, 10, HybridWeights::default())
            .await?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].search_type, SearchType::Hybrid);
        assert!(results[0].fts_score > 0.0);
        assert!(results[0].semantic_score > 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_regenerate_all_counts() -> Result<()> {
        let svc = service();
        svc.create_prompt(draft("A", "alpha")).await?;
        svc.create_prompt(draft("B", "beta")).await?;
        svc.drain_background().await;

        let report = svc.regenerate_all_embeddings().await?;
        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(svc.stats().await?.embedding_count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_semantic_search_orders_by_similarity() -> Result<()> {
        let svc = service();
        svc.create_prompt(draft("Socratic tutor", "socratic questioning teaching"))
            .await?;
        svc.create_prompt(draft("Budget sheet", "quarterly numbers spreadsheet"))
            .await?;
        svc.drain_background().await;

        let results = svc.semantic_search("socratic questioning", 10).await?;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].prompt.title, "Socratic tutor");
        assert!(results[0].semantic_score > results[1].semantic_score);
        Ok(())
    }

    #[tokio::test]
    async fn test_prefix_resolution_via_service() -> Result<()> {
        let svc = service();
        let prompt = svc.create_prompt(draft("T", "x")).await?;

        let fetched = svc.get_prompt(&prompt.id[..10]).await?;
        assert_eq!(fetched.id, prompt.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_suggestions_never_fail() -> Result<()> {
        let svc = service();
        let prompt = svc.create_prompt(draft("T", "Summarize the text.")).await?;

        let suggestions = svc.suggest_improvements(&prompt.id).await?;
        assert!((0.0..=100.0).contains(&suggestions.readability_score));
        Ok(())
    }

    #[tokio::test]
    async fn test_new_with_in_memory_config() -> Result<()> {
        let svc = PromptService::new(&Config::for_tests())?;
        let prompt = svc.create_prompt(draft("T", "x")).await?;
        assert_eq!(svc.get_prompt(&prompt.id).await?.id, prompt.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_category_lifecycle() -> Result<()> {
        let svc = service();
        svc.create_category("writing", Some("prose prompts")).await?;

        let listed = svc.list_categories().await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "writing");

        assert!(svc.delete_category("writing").await?);
        assert!(svc.list_categories().await?.is_empty());
        assert!(!svc.delete_category("writing").await?);
        Ok(())
    }
}
