//! Versions command - list a prompt's history, newest first

use anyhow::Result;
use colored::Colorize;

use crate::service::PromptService;

use super::truncate;

pub async fn run(
    service: &PromptService,
    id: &str,
    version: Option<i64>,
    json: bool,
) -> Result<()> {
    // A specific version requested: point lookup.
    if let Some(n) = version {
        let v = service.get_version(id, n).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&v)?);
        } else {
            println!(
                "{} {} {}",
                format!("v{}", v.version_number).bold(),
                v.title.cyan(),
                v.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
            );
            if let Some(reason) = &v.change_reason {
                println!("  {} {}", "reason:".dimmed(), reason);
            }
            println!();
            println!("{}", v.content);
        }
        return Ok(());
    }

    let versions = service.list_versions(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }

    if versions.is_empty() {
        println!("{}", "No versions yet (history starts on first edit).".yellow());
        return Ok(());
    }

    println!("{} versions", versions.len());
    println!();
    for v in &versions {
        println!(
            "{} {} {}",
            format!("v{}", v.version_number).bold(),
            v.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            v.change_reason.as_deref().unwrap_or("").dimmed()
        );
        println!("  {}", truncate(&v.content, 80).dimmed());
    }

    Ok(())
}
