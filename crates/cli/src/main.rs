//! quill - newsroom administration tool.
//!
//! Runs commands directly against the configured store as the local CLI
//! agent, which bypasses business permissions.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

/// quill - newsroom administration tool
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage authors
    #[command(subcommand)]
    Authors(commands::authors::AuthorsCommand),

    /// Development and debugging helpers
    #[command(subcommand)]
    Dev(commands::dev::DevCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Authors(command) => commands::authors::run(command).await,
        Commands::Dev(command) => commands::dev::run(command).await,
    }
}
