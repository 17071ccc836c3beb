//! Restore command - roll a prompt back to an earlier version

use anyhow::Result;
use colored::Colorize;

use crate::service::PromptService;

use super::short_id;

pub async fn run(
    service: &PromptService,
    id: &str,
    version: i64,
    reason: Option<String>,
    json: bool,
) -> Result<()> {
    let prompt = service
        .restore_version(id, version, reason.as_deref())
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
    } else {
        println!(
            "{} Restored {} ({}) to version {}",
            "✓".green().bold(),
            prompt.title.cyan(),
            short_id(&prompt.id).dimmed(),
            version.to_string().bold()
        );
        println!(
            "  {} the pre-restore state was kept as a new version",
            "→".dimmed()
        );
    }

    service.drain_background().await;

    Ok(())
}
