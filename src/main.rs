mod commands;
mod config;
mod core;
mod search;
mod service;
mod store;
mod suggest;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::search::SearchMode;
use config::Config;
use service::PromptService;

#[derive(Parser)]
#[command(name = "promptkeep")]
#[command(about = "Personal prompt manager with hybrid search and version history", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new prompt
    Add {
        title: String,
        content: String,
        #[arg(long, help = "Category label")]
        category: Option<String>,
        #[arg(long, help = "Comma-separated tags")]
        tags: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show a prompt (full or prefix id)
    Show {
        id: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// List prompts
    List {
        #[arg(long, help = "Filter by category")]
        category: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Update prompt fields (previous state is kept as a version)
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, help = "Remove the category")]
        clear_category: bool,
        #[arg(long, help = "Comma-separated tags (replaces existing)")]
        tags: Option<String>,
        #[arg(long, help = "Change reason recorded on the version")]
        reason: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Delete a prompt and its history
    Delete {
        id: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Search prompts
    Search {
        query: String,
        #[arg(long, value_enum, default_value = "auto", help = "Search mode")]
        mode: SearchMode,
        #[arg(long, help = "Filter by category")]
        category: Option<String>,
        #[arg(long, short, help = "Limit results")]
        limit: Option<usize>,
        #[arg(long, help = "Lexical weight for hybrid merging")]
        fts_weight: Option<f64>,
        #[arg(long, help = "Semantic weight for hybrid merging")]
        semantic_weight: Option<f64>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// List version history (newest first), or show one version
    Versions {
        id: String,
        #[arg(long, short, help = "Show a specific version")]
        version: Option<i64>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Restore a prompt to an earlier version
    Restore {
        id: String,
        version: i64,
        #[arg(long, help = "Change reason recorded on the version")]
        reason: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Get improvement suggestions for a prompt
    Suggest {
        id: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Regenerate embeddings (all prompts, or one with --id)
    Reindex {
        #[arg(long, help = "Regenerate a single prompt")]
        id: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// List categories, or add one with --add
    Categories {
        #[arg(long, help = "Create a category")]
        add: Option<String>,
        #[arg(long, conflicts_with = "add", help = "Delete a category")]
        remove: Option<String>,
        #[arg(long, help = "Category description (with --add)")]
        description: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show store statistics
    Status {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let service = PromptService::new(&config)?;

    match cli.command {
        Commands::Add {
            title,
            content,
            category,
            tags,
            json,
        } => commands::add::run(&service, title, content, category, tags, json).await,
        Commands::Show { id, json } => commands::show::run(&service, &id, json).await,
        Commands::List { category, json } => commands::list::run(&service, category, json).await,
        Commands::Edit {
            id,
            title,
            content,
            category,
            clear_category,
            tags,
            reason,
            json,
        } => {
            commands::edit::run(
                &service,
                &id,
                title,
                content,
                category,
                clear_category,
                tags,
                reason,
                json,
            )
            .await
        }
        Commands::Delete { id, json } => commands::delete::run(&service, &id, json).await,
        Commands::Search {
            query,
            mode,
            category,
            limit,
            fts_weight,
            semantic_weight,
            json,
        } => {
            commands::search::run(
                &service,
                &query,
                mode,
                category,
                limit,
                fts_weight,
                semantic_weight,
                json,
            )
            .await
        }
        Commands::Versions { id, version, json } => {
            commands::versions::run(&service, &id, version, json).await
        }
        Commands::Restore {
            id,
            version,
            reason,
            json,
        } => commands::restore::run(&service, &id, version, reason, json).await,
        Commands::Suggest { id, json } => commands::suggest::run(&service, &id, json).await,
        Commands::Reindex { id, json } => commands::reindex::run(&service, id, json).await,
        Commands::Categories {
            add,
            remove,
            description,
            json,
        } => commands::categories::run(&service, add, remove, description, json).await,
        Commands::Status { json } => commands::status::run(&service, &config, json).await,
    }
}
