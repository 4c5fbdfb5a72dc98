//! Flow CLI
//!
//! Boots the built-in extensions and manages which extensions are activated.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::CliContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: cannot set up logging: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} Flow extension catalog", "flow".green().bold());
            println!();
            println!("Run {} for available commands.", "flow --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Boot {
            options,
            settings,
            json,
        } => commands::run_boot(&CliContext::new(options, settings), json),
        Commands::CheckId { ids } => commands::run_check_id(&ids),
        Commands::List { settings } => commands::run_list(&CliContext::new(None, settings)),
        Commands::Activate { id, settings } => {
            commands::run_activate(&CliContext::new(None, settings), &id)
        }
        Commands::Deactivate { id, settings } => {
            commands::run_deactivate(&CliContext::new(None, settings), &id)
        }
    }
}
