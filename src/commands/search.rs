//! Search command - hybrid, lexical or semantic

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;

use crate::core::model::SearchResult;
use crate::search::{HybridWeights, DEFAULT_LIMIT};
use crate::service::PromptService;

use super::{short_id, truncate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchMode {
    /// Hybrid when embeddings exist, lexical otherwise
    Auto,
    Hybrid,
    Lexical,
    Semantic,
}

#[allow(clippy::too_many_arguments)]
pub async fn run(
    service: &PromptService,
    query: &str,
    mode: SearchMode,
    category: Option<String>,
    limit: Option<usize>,
    fts_weight: Option<f64>,
    semantic_weight: Option<f64>,
    json: bool,
) -> Result<()> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    let category = category.as_deref();

    let mut weights = HybridWeights::default();
    if let Some(w) = fts_weight {
        weights.fts = w;
    }
    if let Some(w) = semantic_weight {
        weights.semantic = w;
    }

    let results = match mode {
        SearchMode::Auto => service.search(query, category).await?,
        SearchMode::Hybrid => {
            service
                .hybrid_search(query, category, limit, weights)
                .await?
        }
        SearchMode::Lexical => {
            let mut r = service.lexical_search(query, category).await?;
            r.truncate(limit);
            r
        }
        SearchMode::Semantic => service.semantic_search(query, limit).await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{} No results found for: {}", "→".dimmed(), query.cyan());
        return Ok(());
    }

    println!(
        "{} {} results for: {}",
        "→".dimmed(),
        results.len(),
        query.cyan()
    );
    println!();

    for (i, result) in results.iter().enumerate() {
        print_result(i, result);
    }

    Ok(())
}

fn print_result(i: usize, result: &SearchResult) {
    let score_str = format!("{:.2}", result.hybrid_score);
    let score_colored = if result.hybrid_score > 0.8 {
        score_str.green()
    } else if result.hybrid_score > 0.4 {
        score_str.yellow()
    } else {
        score_str.dimmed()
    };

    println!(
        "{}. [{}] {} {} ({})",
        (i + 1).to_string().bold(),
        score_colored,
        result.prompt.title.cyan(),
        format!("<{}>", result.search_type.as_str()).dimmed(),
        short_id(&result.prompt.id).dimmed()
    );
    println!("   {}", truncate(&result.prompt.content, 100).dimmed());
    if let Some(cat) = &result.prompt.category {
        println!("   {}", cat);
    }
    println!();
}
