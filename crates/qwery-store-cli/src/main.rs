//! Qwery Store CLI - inspect and maintain a local Qwery document store
//!
//! Thin command-line front end over the `qwery-store` library: raw document
//! access by key, entity listings, identifier tools and the secret vault.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod commands;
mod config;
mod helpers;
mod output;

use app::AppContext;
use cli::{Cli, Commands};

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "QWERY_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let ctx = AppContext::new(&cli);

    match &cli.command {
        Commands::Root => commands::handle_root(&ctx),
        Commands::Keys(args) => commands::handle_keys(&ctx, args).await,
        Commands::Get(args) => commands::handle_get(&ctx, args).await,
        Commands::Rm(args) => commands::handle_rm(&ctx, args).await,
        Commands::List(args) => commands::handle_list(&ctx, args).await,
        Commands::Messages(args) => commands::handle_messages(&ctx, args).await,
        Commands::Id(args) => commands::handle_id(&ctx, args),
        Commands::IdTime(args) => commands::handle_id_time(&ctx, args),
        Commands::Protect(args) => commands::handle_protect(&ctx, args),
        Commands::Reveal(args) => commands::handle_reveal(&ctx, args),
        Commands::Completions { shell } => commands::handle_completions(*shell),
    }
}
