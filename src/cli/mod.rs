//! CLI module for NextMonth
//!
//! Provides commands:
//! - `serve`: Start the workspace server
//! - `terminal`: Interactive shell session against a running server

use clap::{Parser, Subcommand};

pub mod terminal;

/// NextMonth workspace CLI
#[derive(Parser, Debug)]
#[command(name = "nextmonth")]
#[command(about = "Workspace server with interactive terminals")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server
    Serve,
    /// Open an interactive terminal session on a running server
    Terminal(terminal::TerminalArgs),
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) => crate::server::run().await,
        Some(Commands::Terminal(args)) => terminal::run(args).await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
