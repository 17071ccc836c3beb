//! Delete command - remove a prompt, its versions and its embedding

use anyhow::Result;
use colored::Colorize;

use crate::core::error::PromptError;
use crate::service::PromptService;

use super::print_not_found_hint;

pub async fn run(service: &PromptService, id: &str, json: bool) -> Result<()> {
    match service.delete_prompt(id).await {
        Ok(_) => {
            if json {
                println!("{}", serde_json::json!({ "deleted": true }));
            } else {
                println!("{} Deleted prompt {}", "✓".green().bold(), id.cyan());
            }
            Ok(())
        }
        Err(PromptError::NotFound(_)) if !json => {
            eprintln!("{} No prompt matches '{}'", "✗".red().bold(), id);
            print_not_found_hint();
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
