//! Prompt-improvement suggestions.
//!
//! The primary path asks an LLM for structured feedback. Any failure or
//! malformed reply is replaced by deterministic heuristics computed from
//! the content itself; callers never see an error from this module.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::config::Config;

const REMOTE_TIMEOUT: Duration = Duration::from_secs(15);

/// Structured improvement feedback for a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestions {
    pub improvements: Vec<String>,
    pub readability_score: f64,
    pub suggestions: SuggestionAreas,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionAreas {
    pub clarity: String,
    pub specificity: String,
    pub constraints: String,
}

/// Suggestion service client.
#[derive(Clone)]
pub struct SuggestionClient {
    client: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl SuggestionClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REMOTE_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: config.api_key.clone(),
            api_base: config.api_base.clone(),
            model: config.suggestion_model.clone(),
        }
    }

    /// Client that always answers heuristically.
    pub fn offline() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: None,
            api_base: String::new(),
            model: String::new(),
        }
    }

    /// Get improvement suggestions for a prompt. Never fails.
    pub async fn suggest(&self, content: &str, category: Option<&str>) -> Suggestions {
        if self.api_key.is_some() {
            match self.suggest_remote(content, category).await {
                Ok(suggestions) => return suggestions,
                Err(e) => {
                    warn!(error = %e, "suggestion service failed, using heuristics");
                }
            }
        }
        heuristic_suggestions(content)
    }

    async fn suggest_remote(
        &self,
        content: &str,
        category: Option<&str>,
    ) -> anyhow::Result<Suggestions> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no API key configured"))?;

        let prompt = format!(
            "Analyze this prompt{} and reply with a JSON object shaped as \
             {{\"improvements\": [string], \"readability_score\": number, \
             \"suggestions\": {{\"clarity\": string, \"specificity\": string, \
             \"constraints\": string}}}}.\n\nPrompt:\n{}",
            category
                .map(|c| format!(" (category: {})", c))
                .unwrap_or_default(),
            content,
        );

        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&ChatRequest {
                model: &self.model,
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
                response_format: ResponseFormat {
                    format_type: "json_object",
                },
            })
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let body = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("empty completion response"))?;

        Ok(serde_json::from_str(&body)?)
    }
}

/// Deterministic fallback computed from simple content statistics.
pub fn heuristic_suggestions(content: &str) -> Suggestions {
    let word_count = content.split_whitespace().count();
    let sentence_count = content
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1);
    let words_per_sentence = word_count as f64 / sentence_count as f64;

    // Long sentences drag the score down from 100.
    let readability_score = (100.0 - (words_per_sentence - 12.0).max(0.0) * 3.0).clamp(0.0, 100.0);

    let mut improvements = Vec::new();
    if word_count < 10 {
        improvements.push("Expand the prompt with more context about the task".to_string());
    }
    if word_count > 300 {
        improvements.push("Consider splitting this into smaller, focused prompts".to_string());
    }
    let lower = content.to_lowercase();
    if !lower.contains("example") {
        improvements.push("Add an example of the expected output".to_string());
    }
    if words_per_sentence > 25.0 {
        improvements.push("Break up long sentences for readability".to_string());
    }

    let has_constraints = ["must", "should", "only", "format", "limit", "do not"]
        .iter()
        .any(|kw| lower.contains(kw));

    Suggestions {
        improvements,
        readability_score,
        suggestions: SuggestionAreas {
            clarity: if words_per_sentence > 20.0 {
                "Shorten sentences and lead with the main instruction".to_string()
            } else {
                "Sentence length is reasonable; state the goal in the first line".to_string()
            },
            specificity: if word_count < 30 {
                "Describe the desired output, audience and tone explicitly".to_string()
            } else {
                "Good level of detail; verify each requirement is testable".to_string()
            },
            constraints: if has_constraints {
                "Constraints are present; group them in a dedicated section".to_string()
            } else {
                "Add explicit constraints (length, format, things to avoid)".to_string()
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristics_deterministic() {
        let a = heuristic_suggestions("Write a haiku about autumn.");
        let b = heuristic_suggestions("Write a haiku about autumn.");
        assert_eq!(a.readability_score, b.readability_score);
        assert_eq!(a.improvements, b.improvements);
    }

    #[test]
    fn test_short_prompt_flagged() {
        let s = heuristic_suggestions("Do it.");
        assert!(s
            .improvements
            .iter()
            .any(|i| i.contains("Expand the prompt")));
    }

    #[test]
    fn test_constraints_detected() {
        let with = heuristic_suggestions("You must answer in JSON format. For example: {}");
        assert!(with.suggestions.constraints.contains("present"));

        let without = heuristic_suggestions("Tell me about birds and their long migrations.");
        assert!(without.suggestions.constraints.contains("Add explicit"));
    }

    #[test]
    fn test_readability_bounds() {
        let rambling = "word ".repeat(200);
        let s = heuristic_suggestions(&rambling);
        assert!((0.0..=100.0).contains(&s.readability_score));
    }

    #[tokio::test]
    async fn test_offline_client_never_fails() {
        let client = SuggestionClient::offline();
        let s = client.suggest("Summarize this document.", Some("writing")).await;
        assert!((0.0..=100.0).contains(&s.readability_score));
    }
}
