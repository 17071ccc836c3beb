//! Embedding provider: external service with a deterministic local fallback.
//!
//! The primary path calls an OpenAI-compatible embeddings endpoint. Every
//! failure there (missing key, timeout, auth, malformed body) degrades to
//! the local generator, so `embed` never fails and a broken service never
//! blocks a write.
//!
//! The local fallback is a training-free hashed feature scheme:
//! - token identity via FNV-1a bucketing
//! - a token-length signal in a second hashed lane
//! - trailing lanes for coarse document statistics (length, word count,
//!   sentence count, character diversity)
//! mean-pooled and L2-normalized, so same text always yields the same unit
//! vector and cosine similarity is meaningful.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::config::Config;

/// Embedding dimension for the local generator.
pub const EMBEDDING_DIM: usize = 384;

/// Model marker stored for locally generated vectors.
pub const LOCAL_MODEL: &str = "local-hash-v1";

/// Input is truncated to this many characters before the remote call.
const MAX_INPUT_CHARS: usize = 8000;

/// Trailing lanes reserved for document statistics.
const STATS_LANES: usize = 6;
const TOKEN_LANES: usize = EMBEDDING_DIM - STATS_LANES;

const REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Embedding provider. Cheap to clone.
#[derive(Clone)]
pub struct Embedder {
    client: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl Embedder {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REMOTE_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: config.api_key.clone(),
            api_base: config.api_base.clone(),
            model: config.embedding_model.clone(),
        }
    }

    /// Provider that never calls out (tests, offline use).
    pub fn local_only() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: None,
            api_base: String::new(),
            model: String::new(),
        }
    }

    /// Embed text, returning the vector and the model that produced it.
    /// Never fails: any remote problem falls back to the local generator.
    pub async fn embed(&self, text: &str) -> (Vec<f32>, String) {
        if self.api_key.is_some() {
            match self.embed_remote(text).await {
                Ok(vector) => return (vector, self.model.clone()),
                Err(e) => {
                    warn!(error = %e, "embedding service failed, using local fallback");
                }
            }
        }
        (local_embedding(text), LOCAL_MODEL.to_string())
    }

    async fn embed_remote(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no API key configured"))?;

        let input: String = text.chars().take(MAX_INPUT_CHARS).collect();
        let url = format!("{}/embeddings", self.api_base.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: &input,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;

        let vector = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| anyhow::anyhow!("empty embedding response"))?;

        if vector.is_empty() {
            anyhow::bail!("embedding service returned a zero-length vector");
        }
        // Parsed straight into f32, so the persisted blob round-trips
        // bit-exactly.
        Ok(vector)
    }
}

/// Deterministic local embedding. Empty input yields the zero vector;
/// anything else is L2-normalized to unit length.
pub fn local_embedding(text: &str) -> Vec<f32> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return vec![0.0; EMBEDDING_DIM];
    }

    let mut acc = vec![0.0f64; EMBEDDING_DIM];

    for token in &tokens {
        let h = fnv1a(token.as_bytes());
        let token_len = token.chars().count();

        // Token identity lane.
        acc[(h % TOKEN_LANES as u64) as usize] += 1.0;
        // Token length signal in an independently hashed lane.
        acc[((h >> 32) % TOKEN_LANES as u64) as usize] += (token_len as f64).ln_1p();
    }

    // Mean pooling over tokens.
    let count = tokens.len() as f64;
    for val in acc.iter_mut().take(TOKEN_LANES) {
        *val /= count;
    }

    // Coarse document statistics in the reserved trailing lanes.
    let char_count = text.chars().count();
    let unique_chars = {
        let mut seen: Vec<char> = text.chars().collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    };
    let sentence_count = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();
    let avg_token_len =
        tokens.iter().map(|t| t.chars().count()).sum::<usize>() as f64 / count;
    let distinct_tokens = {
        let mut sorted = tokens.clone();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.len()
    };

    let stats_base = TOKEN_LANES;
    acc[stats_base] = (char_count as f64).ln_1p();
    acc[stats_base + 1] = count.ln_1p();
    acc[stats_base + 2] = (sentence_count as f64).ln_1p();
    acc[stats_base + 3] = unique_chars as f64 / char_count.max(1) as f64;
    acc[stats_base + 4] = avg_token_len.ln_1p();
    acc[stats_base + 5] = distinct_tokens as f64 / count;

    // L2 normalize and convert to f32.
    let norm: f64 = acc.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        acc.iter().map(|x| (*x / norm) as f32).collect()
    } else {
        acc.iter().map(|x| *x as f32).collect()
    }
}

/// Splits text into lowercase words on whitespace and ASCII punctuation.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// FNV-1a, 64 bit.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Cosine similarity between two vectors of equal dimensionality.
/// Callers are responsible for the dimension check; mismatched inputs
/// score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

/// Convert f32 embedding to a little-endian BLOB.
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

/// Convert a BLOB back to an f32 embedding.
pub fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap_or([0; 4])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_embedding_deterministic() {
        let a = local_embedding("hello world");
        let b = local_embedding("hello world");
        let c = local_embedding("goodbye moon");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_local_embedding_unit_norm() {
        let emb = local_embedding("The quick brown fox jumps over the lazy dog.");
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_local_embedding_empty_input() {
        let emb = local_embedding("");
        assert_eq!(emb, vec![0.0; EMBEDDING_DIM]);

        let emb = local_embedding("   \t\n");
        assert_eq!(emb, vec![0.0; EMBEDDING_DIM]);
    }

    #[test]
    fn test_shared_tokens_raise_similarity() {
        let a = local_embedding("socratic questioning for teaching");
        let b = local_embedding("socratic teaching methods");
        let unrelated = local_embedding("quarterly budget spreadsheet");

        let sim_related = cosine_similarity(&a, &b);
        let sim_unrelated = cosine_similarity(&a, &unrelated);
        assert!(sim_related > sim_unrelated);
    }

    #[test]
    fn test_cosine_similarity_properties() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let d = vec![-1.0, 0.0, 0.0];

        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&a, &b).abs() < 0.001);
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        // Symmetric.
        let x = local_embedding("alpha beta");
        let y = local_embedding("beta gamma");
        assert!((cosine_similarity(&x, &y) - cosine_similarity(&y, &x)).abs() < 1e-6);
    }

    #[test]
    fn test_blob_round_trip() {
        let embedding = vec![1.0, 2.0, 3.0, -0.5];
        let blob = embedding_to_blob(&embedding);
        let recovered = blob_to_embedding(&blob);
        assert_eq!(embedding, recovered);

        let emb = local_embedding("round trip me");
        let recovered = blob_to_embedding(&embedding_to_blob(&emb));
        assert_eq!(emb, recovered);
    }

    #[tokio::test]
    async fn test_embed_without_key_uses_local() {
        let embedder = Embedder::local_only();
        let (vector, model) = embedder.embed("hello").await;
        assert_eq!(model, LOCAL_MODEL);
        assert_eq!(vector, local_embedding("hello"));
    }
}
