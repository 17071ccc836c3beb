//! Status command - store statistics

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::service::PromptService;

pub async fn run(service: &PromptService, config: &Config, json: bool) -> Result<()> {
    let stats = service.stats().await?;

    let file_size = std::fs::metadata(&config.db_path).map(|m| m.len()).unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "prompts": stats.prompt_count,
                "versions": stats.version_count,
                "embeddings": stats.embedding_count,
                "categories": stats.category_count,
                "last_updated": stats.last_updated.map(|t| t.to_rfc3339()),
                "db_path": config.db_path.display().to_string(),
                "file_size_bytes": file_size,
            })
        );
        return Ok(());
    }

    println!("{}", "Store Status".bold());
    println!();
    println!(
        "  {} {} prompts",
        "→".dimmed(),
        stats.prompt_count.to_string().cyan()
    );
    println!(
        "  {} {} versions",
        "→".dimmed(),
        stats.version_count.to_string().cyan()
    );
    println!(
        "  {} {} embeddings",
        "→".dimmed(),
        stats.embedding_count.to_string().cyan()
    );
    println!(
        "  {} {} categories",
        "→".dimmed(),
        stats.category_count.to_string().cyan()
    );
    if let Some(ts) = stats.last_updated {
        println!(
            "  {} Last updated: {}",
            "→".dimmed(),
            ts.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!(
        "  {} {} ({:.2} KB)",
        "→".dimmed(),
        config.db_path.display(),
        file_size as f64 / 1024.0
    );

    Ok(())
}
