//! Status command - show the persisted tracking preference.

use std::path::PathBuf;

use locus::app::AppConfig;
use locus::preferences::FilePreferenceStore;

use crate::error::CliError;
use crate::runner::load_config;

/// Run the status command.
pub fn run(config_path: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let (_, config) = load_config(config_path.as_deref())?;
    let app_config = AppConfig::from_config_file(&config);
    let enabled = FilePreferenceStore::peek(&app_config.preferences_file)?;

    if json {
        let status = serde_json::json!({
            "tracking_enabled": enabled,
            "preferences_file": app_config.preferences_file.display().to_string(),
        });
        println!("{}", status);
    } else {
        println!(
            "Tracking: {}",
            if enabled { "enabled" } else { "disabled" }
        );
        println!("Preferences: {}", app_config.preferences_file.display());
    }
    Ok(())
}
