mod cli;
mod commands;
mod logging;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use commands::CommandOptions;
use logging::Verbosity;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    let options = CommandOptions {
        quiet: cli.quiet,
        config_path: cli.config.as_deref(),
        no_config: cli.no_config,
        source: cli.source.clone(),
        output: cli.output.clone(),
        journal: cli.journal.clone(),
        debounce_ms: cli.debounce_ms,
    };

    match &cli.command {
        Commands::Sync { force } => {
            commands::SyncOnce::execute(&options, *force).context("Failed to execute sync command")?;
        }
        Commands::Monitor => {
            commands::Monitor::execute(&options).context("Failed to execute monitor command")?;
        }
        Commands::Status => {
            commands::Status::execute(&options).context("Failed to execute status command")?;
        }
    }

    Ok(())
}
