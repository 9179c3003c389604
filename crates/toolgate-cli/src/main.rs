//! Toolgate CLI entry point
//!
//! Exit codes: 0 on success, 1 on any failure, 130 when the user cancels an
//! interactive review with Ctrl-C.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

/// Exit code for a user-cancelled interactive session
pub const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    // Logging goes to stderr; stdout carries tables, prompts, and YAML
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Review(args) => commands::review::run(args).await,
        Commands::Compare(args) => commands::compare::run(args).await,
        Commands::Webserver(args) => commands::webserver::run(args).await,
    };

    match outcome {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    }
}
