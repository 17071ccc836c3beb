//! Categories command - list, add or remove category labels

use anyhow::Result;
use colored::Colorize;

use crate::service::PromptService;

pub async fn run(
    service: &PromptService,
    add: Option<String>,
    remove: Option<String>,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    if let Some(name) = remove {
        let removed = service.delete_category(&name).await?;
        if json {
            println!("{}", serde_json::json!({ "removed": removed }));
        } else if removed {
            println!("{} Removed category {}", "✓".green().bold(), name.cyan());
        } else {
            println!("{} No category named {}", "✗".red(), name.cyan());
            std::process::exit(1);
        }
        return Ok(());
    }

    if let Some(name) = add {
        let category = service
            .create_category(&name, description.as_deref())
            .await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&category)?);
        } else {
            println!("{} Created category {}", "✓".green().bold(), category.name.cyan());
        }
        return Ok(());
    }

    let categories = service.list_categories().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&categories)?);
        return Ok(());
    }

    if categories.is_empty() {
        println!("{}", "No categories yet.".yellow());
        return Ok(());
    }

    for category in &categories {
        match &category.description {
            Some(desc) => println!("{}  {}", category.name.cyan(), desc.dimmed()),
            None => println!("{}", category.name.cyan()),
        }
    }

    Ok(())
}
