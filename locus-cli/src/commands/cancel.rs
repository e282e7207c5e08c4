//! Cancel command - the "cancel" process entry point.
//!
//! Starts a coordinator with [`StartCommand::CancelTracking`], which resumes
//! any tracking left enabled, cancels it and stops the background presence.
//! The process exits once the presence has stopped.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use locus::app::{build_runtime, LocationServiceHost};
use locus::coordinator::{Presence, StartCommand};
use locus::indicator::IndicatorBoard;
use locus::preferences::FilePreferenceStore;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Upper bound on how long the provider may take to settle the removal.
const CANCEL_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the cancel command.
pub fn run(config_path: Option<PathBuf>, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path.as_deref(), debug)?;
    runner.log_startup("cancel");
    let app_config = runner.app_config().clone();

    let runtime = build_runtime()?;
    let stopped = runtime.block_on(async {
        let (host, _provider) =
            LocationServiceHost::simulated(&app_config, Arc::new(IndicatorBoard::new()))?;
        let handle = host.start(StartCommand::CancelTracking)?;

        let stopped =
            tokio::time::timeout(CANCEL_TIMEOUT, handle.wait_for_presence(Presence::Stopped))
                .await
                .unwrap_or(false);

        host.shutdown().await;
        Ok::<bool, CliError>(stopped)
    })?;

    let enabled = FilePreferenceStore::peek(&app_config.preferences_file)?;
    match (stopped, enabled) {
        (true, false) => println!("Tracking cancelled."),
        (true, true) => {
            println!("Tracking could not be cancelled: location permission was lost.");
            println!("The tracking preference remains enabled.");
        }
        (false, _) => println!("Timed out waiting for the cancellation to settle."),
    }
    Ok(())
}
