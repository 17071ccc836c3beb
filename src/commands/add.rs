//! Add command - create a new prompt

use anyhow::Result;
use colored::Colorize;

use crate::core::model::{parse_tag_string, PromptDraft};
use crate::service::PromptService;

use super::short_id;

pub async fn run(
    service: &PromptService,
    title: String,
    content: String,
    category: Option<String>,
    tags: Option<String>,
    json: bool,
) -> Result<()> {
    let draft = PromptDraft {
        title,
        content,
        category,
        tags: tags.as_deref().map(parse_tag_string).unwrap_or_default(),
    };

    let prompt = service.create_prompt(draft).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
    } else {
        println!(
            "{} Created {} ({})",
            "✓".green().bold(),
            prompt.title.cyan(),
            short_id(&prompt.id).dimmed()
        );
        if let Some(cat) = &prompt.category {
            println!("  {} category: {}", "→".dimmed(), cat);
        }
        if !prompt.tags.is_empty() {
            println!("  {} tags: {}", "→".dimmed(), prompt.tags.join(", "));
        }
    }

    // Let the spawned embedding refresh land before the process exits.
    service.drain_background().await;

    Ok(())
}
