//! Edit command - update prompt fields (snapshots the previous state)

use anyhow::Result;
use colored::Colorize;

use crate::core::model::{parse_tag_string, PromptPatch};
use crate::service::PromptService;

use super::short_id;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    service: &PromptService,
    id: &str,
    title: Option<String>,
    content: Option<String>,
    category: Option<String>,
    clear_category: bool,
    tags: Option<String>,
    reason: Option<String>,
    json: bool,
) -> Result<()> {
    let patch = PromptPatch {
        title,
        content,
        category: if clear_category {
            Some(None)
        } else {
            category.map(Some)
        },
        tags: tags.as_deref().map(parse_tag_string),
    };

    if patch.is_empty() {
        anyhow::bail!("nothing to change; pass at least one of --title/--content/--category/--tags");
    }

    let prompt = service.update_prompt(id, patch, reason.as_deref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
    } else {
        println!(
            "{} Updated {} ({})",
            "✓".green().bold(),
            prompt.title.cyan(),
            short_id(&prompt.id).dimmed()
        );
    }

    service.drain_background().await;

    Ok(())
}
