//! Locus CLI - Command-line interface
//!
//! Hosts the tracking coordinator with a simulated provider and a terminal
//! consumer, and exposes the process entry points.

mod commands;
mod error;
mod runner;
mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::run::RunArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "locus")]
#[command(version = locus::VERSION)]
#[command(about = "Foreground-only location tracking", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    /// Config file to use instead of ~/.locus/config.ini
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the coordinator with an interactive terminal consumer
    Run {
        /// Start with the location permission revoked
        #[arg(long)]
        deny_permission: bool,

        /// Delay before the simulated provider settles a removal
        #[arg(long, value_name = "MS", default_value = "0")]
        removal_delay_ms: u64,

        /// Do not attach the terminal consumer at startup
        #[arg(long)]
        detached: bool,
    },

    /// Cancel tracking, as the indicator's cancel action would, then exit
    Cancel,

    /// Show the persisted tracking preference
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration, or write the default config file
    Config {
        /// Write ~/.locus/config.ini with defaults if it does not exist
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Run {
            deny_permission,
            removal_delay_ms,
            detached,
        } => commands::run::run(RunArgs {
            config_path: cli.config,
            debug: cli.debug,
            deny_permission,
            removal_delay_ms,
            detached,
        }),
        Commands::Cancel => commands::cancel::run(cli.config, cli.debug),
        Commands::Status { json } => commands::status::run(cli.config, json),
        Commands::Config { init } => commands::config::run(cli.config, init),
    };

    if let Err(e) = result {
        e.exit();
    }
}
