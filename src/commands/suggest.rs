//! Suggest command - improvement feedback for a prompt

use anyhow::Result;
use colored::Colorize;

use crate::service::PromptService;

pub async fn run(service: &PromptService, id: &str, json: bool) -> Result<()> {
    let prompt = service.get_prompt(id).await?;
    let suggestions = service.suggest_improvements(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    println!("Suggestions for {}", prompt.title.bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "Readability: {}",
        format!("{:.0}/100", suggestions.readability_score).bold()
    );
    println!();

    if suggestions.improvements.is_empty() {
        println!("{}", "No specific improvements flagged.".green());
    } else {
        for improvement in &suggestions.improvements {
            println!("  {} {}", "•".dimmed(), improvement);
        }
    }

    println!();
    println!("{}  {}", "clarity:".bold(), suggestions.suggestions.clarity);
    println!(
        "{}  {}",
        "specificity:".bold(),
        suggestions.suggestions.specificity
    );
    println!(
        "{}  {}",
        "constraints:".bold(),
        suggestions.suggestions.constraints
    );

    Ok(())
}
