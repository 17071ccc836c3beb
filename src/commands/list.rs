//! List command - enumerate prompts

use anyhow::Result;
use colored::Colorize;

use crate::service::PromptService;

use super::{short_id, truncate};

pub async fn run(service: &PromptService, category: Option<String>, json: bool) -> Result<()> {
    let prompts = service.list_prompts(category.as_deref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prompts)?);
        return Ok(());
    }

    if prompts.is_empty() {
        println!("{}", "No prompts yet.".yellow());
        return Ok(());
    }

    println!("{} prompts", prompts.len());
    println!();
    for prompt in &prompts {
        println!(
            "{} {} {}",
            short_id(&prompt.id).dimmed(),
            prompt.title.cyan(),
            prompt
                .category
                .as_deref()
                .map(|c| format!("[{}]", c))
                .unwrap_or_default()
        );
        println!("  {}", truncate(&prompt.content, 80).dimmed());
    }

    Ok(())
}
