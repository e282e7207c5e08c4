//! Run command - host the coordinator with an interactive terminal consumer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use locus::app::{build_runtime, LocationServiceHost};
use locus::coordinator::StartCommand;

use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui::{Console, TerminalIndicator};

/// Arguments for the run command.
pub struct RunArgs {
    pub config_path: Option<PathBuf>,
    pub debug: bool,
    pub deny_permission: bool,
    pub removal_delay_ms: u64,
    pub detached: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config_path.as_deref(), args.debug)?;
    runner.log_startup("run");

    let app_config = runner
        .app_config()
        .clone()
        .with_removal_delay(Duration::from_millis(args.removal_delay_ms));

    let quit = CancellationToken::new();
    let quit_on_signal = quit.clone();
    ctrlc::set_handler(move || quit_on_signal.cancel())
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let runtime = build_runtime()?;
    let result = runtime.block_on(async {
        let indicator = TerminalIndicator::new();
        let (host, provider) =
            LocationServiceHost::simulated(&app_config, Arc::new(indicator.clone()))?;
        if args.deny_permission {
            provider.revoke_permission();
        }

        let handle = host.start(StartCommand::Start)?;
        let mut console = Console::new(handle, provider, indicator, quit);
        let result = console.run(!args.detached).await;

        drop(console);
        host.shutdown().await;
        info!("Run command finished");
        result
    });

    // The stdin reader thread stays blocked on a read; don't wait for it.
    runtime.shutdown_background();
    result
}
