//! Show command - full prompt details

use anyhow::Result;
use colored::Colorize;

use crate::service::PromptService;

pub async fn run(service: &PromptService, id: &str, json: bool) -> Result<()> {
    let prompt = service.get_prompt(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
        return Ok(());
    }

    println!("{}", prompt.title.bold().cyan());
    println!("{}", "=".repeat(60));
    println!("id:       {}", prompt.id);
    if let Some(cat) = &prompt.category {
        println!("category: {}", cat);
    }
    if !prompt.tags.is_empty() {
        println!("tags:     {}", prompt.tags.join(", "));
    }
    println!(
        "created:  {}",
        prompt.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "updated:  {}",
        prompt.updated_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!();
    println!("{}", prompt.content);

    Ok(())
}
