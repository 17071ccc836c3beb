//! Reindex command - regenerate all embeddings

use anyhow::Result;
use colored::Colorize;

use crate::service::PromptService;

pub async fn run(service: &PromptService, id: Option<String>, json: bool) -> Result<()> {
    // Single prompt: synchronous refresh.
    if let Some(id) = id {
        service.regenerate_embedding(&id).await?;
        if json {
            println!("{}", serde_json::json!({ "regenerated": 1 }));
        } else {
            println!("{} Regenerated embedding for {}", "✓".green().bold(), id.cyan());
        }
        return Ok(());
    }

    if !json {
        println!("{} Regenerating embeddings...", "→".dimmed());
    }

    let start = std::time::Instant::now();
    let report = service.regenerate_all_embeddings().await?;
    let duration_ms = start.elapsed().as_millis();

    if json {
        let mut payload = serde_json::to_value(&report)?;
        payload["duration_ms"] = serde_json::Value::from(duration_ms as u64);
        println!("{}", payload);
    } else {
        println!(
            "{} Regenerated {} embeddings in {:.2}s",
            "✓".green().bold(),
            report.successful.to_string().cyan(),
            duration_ms as f64 / 1000.0
        );
        if report.failed > 0 {
            println!("  {} {} failed", "✗".red(), report.failed);
        }
    }

    Ok(())
}
