//! CLI command implementations.

pub mod add;
pub mod categories;
pub mod delete;
pub mod edit;
pub mod list;
pub mod reindex;
pub mod restore;
pub mod search;
pub mod show;
pub mod status;
pub mod suggest;
pub mod versions;

use colored::Colorize;

/// Short display form of a prompt id.
pub(crate) fn short_id(id: &str) -> &str {
    &id[..id.len().min(8)]
}

/// Truncate text for single-line display (char-aware for Unicode).
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    }
}

pub(crate) fn print_not_found_hint() {
    eprintln!(
        "{} Use {} to list prompts and their ids.",
        "→".dimmed(),
        "promptkeep list".cyan()
    );
}
