//! SQLite record store.
//!
//! Single canonical persistence layer: prompts, append-only version
//! snapshots, categories and embedding blobs in one database, with an FTS5
//! table kept in sync by triggers so lexical search is consistent with
//! writes immediately.
//!
//! Embeddings are stored as little-endian f32 BLOBs and similarity is
//! computed in Rust; brute-force is fine at the target scale (thousands of
//! prompts, not millions).

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use crate::core::error::{PromptError, Result};
use crate::core::model::{
    normalize_tags, Category, Prompt, PromptDraft, PromptPatch, PromptVersion, FULL_ID_LEN,
};

/// Record store over a single SQLite connection.
pub struct Store {
    conn: Connection,
}

/// Store-level statistics for the status command.
#[derive(Debug)]
pub struct StoreStats {
    pub prompt_count: usize,
    pub version_count: usize,
    pub embedding_count: usize,
    pub category_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Store {
    /// Open or create a database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PromptError::Other(e.into()))?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS prompts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                category TEXT,
                tags TEXT NOT NULL DEFAULT '[]',  -- JSON array
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS prompt_versions (
                id TEXT PRIMARY KEY,
                prompt_id TEXT NOT NULL REFERENCES prompts(id) ON DELETE CASCADE,
                version_number INTEGER NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                category TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                change_reason TEXT,
                created_at INTEGER NOT NULL,
                UNIQUE (prompt_id, version_number)
            );

            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS embeddings (
                prompt_id TEXT PRIMARY KEY REFERENCES prompts(id) ON DELETE CASCADE,
                vector BLOB NOT NULL,
                model TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE VIRTUAL TABLE IF NOT EXISTS prompts_fts USING fts5(
                id UNINDEXED,
                title,
                content,
                tags,
                category
            );

            CREATE TRIGGER IF NOT EXISTS prompts_ai AFTER INSERT ON prompts BEGIN
                INSERT INTO prompts_fts(id, title, content, tags, category)
                VALUES (new.id, new.title, new.content, new.tags, coalesce(new.category, ''));
            END;

            CREATE TRIGGER IF NOT EXISTS prompts_ad AFTER DELETE ON prompts BEGIN
                DELETE FROM prompts_fts WHERE id = old.id;
            END;

            CREATE TRIGGER IF NOT EXISTS prompts_au AFTER UPDATE ON prompts BEGIN
                DELETE FROM prompts_fts WHERE id = old.id;
                INSERT INTO prompts_fts(id, title, content, tags, category)
                VALUES (new.id, new.title, new.content, new.tags, coalesce(new.category, ''));
            END;

            CREATE INDEX IF NOT EXISTS idx_versions_prompt
                ON prompt_versions(prompt_id, version_number DESC);
            CREATE INDEX IF NOT EXISTS idx_prompts_updated ON prompts(updated_at);
            "#,
        )?;
        Ok(())
    }

    // ===== Identifier resolution =====

    /// Resolve a full or prefix identifier to a unique prompt id.
    ///
    /// Full-length input is an exact lookup; shorter input is a prefix
    /// lookup that fails `Ambiguous` when more than one prompt matches.
    /// Pure read, no side effects.
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(PromptError::InvalidInput(
                "identifier must not be empty".to_string(),
            ));
        }

        if input.len() == FULL_ID_LEN {
            let found: Option<String> = self
                .conn
                .query_row(
                    "SELECT id FROM prompts WHERE id = ?1",
                    params![input],
                    |row| row.get(0),
                )
                .optional()?;
            return found.ok_or_else(|| PromptError::NotFound(input.to_string()));
        }

        // Literal prefix comparison; LIKE would treat `%`/`_` in the
        // input as wildcards. LIMIT 2 is enough to detect ambiguity.
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM prompts WHERE substr(id, 1, length(?1)) = ?1 LIMIT 2")?;
        let matches: Vec<String> = stmt
            .query_map(params![input], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        match matches.len() {
            0 => Err(PromptError::NotFound(input.to_string())),
            1 => Ok(matches.into_iter().next().unwrap_or_default()),
            _ => Err(PromptError::Ambiguous(input.to_string())),
        }
    }

    // ===== Prompt CRUD =====

    /// Insert a new prompt. No version record is written; history starts
    /// with the first update.
    pub fn create_prompt(&self, draft: &PromptDraft) -> Result<Prompt> {
        let now = Utc::now().timestamp();
        let prompt = Prompt {
            id: Uuid::new_v4().to_string(),
            title: draft.title.clone(),
            content: draft.content.clone(),
            category: draft.category.clone(),
            tags: normalize_tags(&draft.tags),
            created_at: from_ts(now),
            updated_at: from_ts(now),
        };

        self.conn.execute(
            "INSERT INTO prompts (id, title, content, category, tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                prompt.id,
                prompt.title,
                prompt.content,
                prompt.category,
                tags_to_json(&prompt.tags),
                now,
                now,
            ],
        )?;

        Ok(prompt)
    }

    pub fn get_prompt(&self, id: &str) -> Result<Option<Prompt>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, title, content, category, tags, created_at, updated_at
                 FROM prompts WHERE id = ?1",
                params![id],
                row_to_prompt,
            )
            .optional()?;
        Ok(result)
    }

    /// List prompts, optionally filtered by exact category, newest first.
    pub fn list_prompts(&self, category: Option<&str>) -> Result<Vec<Prompt>> {
        let mut stmt;
        let rows = match category {
            Some(cat) => {
                stmt = self.conn.prepare(
                    "SELECT id, title, content, category, tags, created_at, updated_at
                     FROM prompts WHERE category = ?1 ORDER BY updated_at DESC",
                )?;
                stmt.query_map(params![cat], row_to_prompt)?
            }
            None => {
                stmt = self.conn.prepare(
                    "SELECT id, title, content, category, tags, created_at, updated_at
                     FROM prompts ORDER BY updated_at DESC",
                )?;
                stmt.query_map([], row_to_prompt)?
            }
        };
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Delete a prompt. Versions and embedding go with it via cascade.
    /// Returns false when the id does not exist.
    pub fn delete_prompt(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM prompts WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    // ===== Version history state machine =====

    /// Apply a partial update: snapshot the pre-update state as the next
    /// version, then overwrite the live row. One transaction; either both
    /// writes land or neither does.
    pub fn update_prompt(
        &mut self,
        id: &str,
        patch: &PromptPatch,
        reason: &str,
    ) -> Result<Prompt> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
            .query_row(
                "SELECT id, title, content, category, tags, created_at, updated_at
                 FROM prompts WHERE id = ?1",
                params![id],
                row_to_prompt,
            )
            .optional()?
            .ok_or_else(|| PromptError::NotFound(id.to_string()))?;

        let next_version = next_version_number(&tx, id)?;
        insert_snapshot(&tx, &current, next_version, Some(reason))?;

        let now = Utc::now().timestamp();
        let updated = Prompt {
            id: current.id.clone(),
            title: patch.title.clone().unwrap_or(current.title),
            content: patch.content.clone().unwrap_or(current.content),
            category: patch.category.clone().unwrap_or(current.category),
            tags: patch
                .tags
                .as_ref()
                .map(|t| normalize_tags(t))
                .unwrap_or(current.tags),
            created_at: current.created_at,
            updated_at: from_ts(now),
        };

        tx.execute(
            "UPDATE prompts SET title = ?1, content = ?2, category = ?3, tags = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                updated.title,
                updated.content,
                updated.category,
                tags_to_json(&updated.tags),
                now,
                id,
            ],
        )?;

        tx.commit()?;
        Ok(updated)
    }

    /// Restore a prompt to the state of an earlier version. Snapshots the
    /// current (pre-restore) state as a new version first, in the same
    /// transaction as the live-row overwrite.
    pub fn restore_version(
        &mut self,
        id: &str,
        version_number: i64,
        reason: &str,
    ) -> Result<Prompt> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = tx
            .query_row(
                "SELECT id, title, content, category, tags, created_at, updated_at
                 FROM prompts WHERE id = ?1",
                params![id],
                row_to_prompt,
            )
            .optional()?
            .ok_or_else(|| PromptError::NotFound(id.to_string()))?;

        let target = tx
            .query_row(
                "SELECT id, prompt_id, version_number, title, content, category, tags,
                        change_reason, created_at
                 FROM prompt_versions WHERE prompt_id = ?1 AND version_number = ?2",
                params![id, version_number],
                row_to_version,
            )
            .optional()?
            .ok_or(PromptError::VersionNotFound {
                prompt_id: id.to_string(),
                version: version_number,
            })?;

        let next_version = next_version_number(&tx, id)?;
        insert_snapshot(&tx, &current, next_version, Some(reason))?;

        let now = Utc::now().timestamp();
        let restored = Prompt {
            id: current.id.clone(),
            title: target.title,
            content: target.content,
            category: target.category,
            tags: target.tags,
            created_at: current.created_at,
            updated_at: from_ts(now),
        };

        tx.execute(
            "UPDATE prompts SET title = ?1, content = ?2, category = ?3, tags = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                restored.title,
                restored.content,
                restored.category,
                tags_to_json(&restored.tags),
                now,
                id,
            ],
        )?;

        tx.commit()?;
        Ok(restored)
    }

    /// List version snapshots newest-first.
    pub fn list_versions(&self, prompt_id: &str) -> Result<Vec<PromptVersion>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, prompt_id, version_number, title, content, category, tags,
                    change_reason, created_at
             FROM prompt_versions WHERE prompt_id = ?1
             ORDER BY version_number DESC",
        )?;
        let rows = stmt.query_map(params![prompt_id], row_to_version)?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    pub fn get_version(&self, prompt_id: &str, version_number: i64) -> Result<PromptVersion> {
        self.conn
            .query_row(
                "SELECT id, prompt_id, version_number, title, content, category, tags,
                        change_reason, created_at
                 FROM prompt_versions WHERE prompt_id = ?1 AND version_number = ?2",
                params![prompt_id, version_number],
                row_to_version,
            )
            .optional()?
            .ok_or(PromptError::VersionNotFound {
                prompt_id: prompt_id.to_string(),
                version: version_number,
            })
    }

    // ===== Embeddings =====

    /// Insert or replace the embedding for a prompt.
    pub fn upsert_embedding(&self, prompt_id: &str, blob: &[u8], model: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO embeddings (prompt_id, vector, model, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(prompt_id) DO UPDATE SET
                vector = excluded.vector,
                model = excluded.model,
                updated_at = excluded.updated_at",
            params![prompt_id, blob, model, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    /// Load every prompt that has an embedding, with its raw vector blob.
    pub fn load_embeddings(&self) -> Result<Vec<(Prompt, Vec<u8>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.title, p.content, p.category, p.tags, p.created_at, p.updated_at,
                    e.vector
             FROM prompts p JOIN embeddings e ON p.id = e.prompt_id",
        )?;
        let rows = stmt.query_map([], |row| {
            let prompt = row_to_prompt(row)?;
            let blob: Vec<u8> = row.get(7)?;
            Ok((prompt, blob))
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    pub fn embedding_count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ===== FTS =====

    /// Run an FTS5 match and return candidate prompts with the engine's
    /// native rank (negative bm25; more negative is more relevant).
    pub fn fts_candidates(&self, match_expr: &str) -> Result<Vec<(Prompt, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.title, p.content, p.category, p.tags, p.created_at, p.updated_at,
                    prompts_fts.rank
             FROM prompts_fts JOIN prompts p ON p.id = prompts_fts.id
             WHERE prompts_fts MATCH ?1",
        )?;
        let rows = stmt.query_map(params![match_expr], |row| {
            let prompt = row_to_prompt(row)?;
            let rank: f64 = row.get(7)?;
            Ok((prompt, rank))
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    // ===== Categories =====

    pub fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PromptError::InvalidInput(
                "category name must not be empty".to_string(),
            ));
        }

        let exists: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM categories WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(PromptError::DuplicateCategory(name.to_string()));
        }

        let now = Utc::now().timestamp();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.map(String::from),
            created_at: from_ts(now),
        };
        self.conn.execute(
            "INSERT INTO categories (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![category.id, category.name, category.description, now],
        )?;
        Ok(category)
    }

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, created_at FROM categories ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                created_at: from_ts(row.get(3)?),
            })
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Remove a category label. Prompts keep their `category` text; the
    /// label table is bookkeeping only.
    pub fn delete_category(&self, name: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE name = ?1", params![name.trim()])?;
        Ok(changed > 0)
    }

    // ===== Stats =====

    pub fn stats(&self) -> Result<StoreStats> {
        let prompt_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM prompts", [], |row| row.get(0))?;
        let version_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM prompt_versions", [], |row| row.get(0))?;
        let embedding_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        let category_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        let last_updated: Option<i64> = self
            .conn
            .query_row("SELECT MAX(updated_at) FROM prompts", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(StoreStats {
            prompt_count: prompt_count as usize,
            version_count: version_count as usize,
            embedding_count: embedding_count as usize,
            category_count: category_count as usize,
            last_updated: last_updated.map(from_ts),
        })
    }
}

fn next_version_number(tx: &rusqlite::Transaction<'_>, prompt_id: &str) -> Result<i64> {
    let max: Option<i64> = tx
        .query_row(
            "SELECT MAX(version_number) FROM prompt_versions WHERE prompt_id = ?1",
            params![prompt_id],
            |row| row.get(0),
        )
        .optional()?
        .flatten();
    Ok(max.unwrap_or(0) + 1)
}

fn insert_snapshot(
    tx: &rusqlite::Transaction<'_>,
    state: &Prompt,
    version_number: i64,
    reason: Option<&str>,
) -> Result<()> {
    tx.execute(
        "INSERT INTO prompt_versions
            (id, prompt_id, version_number, title, content, category, tags, change_reason, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            Uuid::new_v4().to_string(),
            state.id,
            version_number,
            state.title,
            state.content,
            state.category,
            tags_to_json(&state.tags),
            reason,
            Utc::now().timestamp(),
        ],
    )?;
    Ok(())
}

fn row_to_prompt(row: &Row<'_>) -> rusqlite::Result<Prompt> {
    let tags_json: String = row.get(4)?;
    Ok(Prompt {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category: row.get(3)?,
        tags: tags_from_json(&tags_json),
        created_at: from_ts(row.get(5)?),
        updated_at: from_ts(row.get(6)?),
    })
}

fn row_to_version(row: &Row<'_>) -> rusqlite::Result<PromptVersion> {
    let tags_json: String = row.get(6)?;
    Ok(PromptVersion {
        id: row.get(0)?,
        prompt_id: row.get(1)?,
        version_number: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        category: row.get(5)?,
        tags: tags_from_json(&tags_json),
        change_reason: row.get(7)?,
        created_at: from_ts(row.get(8)?),
    })
}

fn tags_to_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

fn tags_from_json(json: &str) -> Vec<String> {
    serde_json::from_str(json).unwrap_or_default()
}

fn from_ts(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}
