//! CLI runner for common setup.
//!
//! Loads configuration and initializes logging for the commands that host a
//! coordinator.

use std::path::{Path, PathBuf};

use tracing::info;

use locus::app::AppConfig;
use locus::config::{config_file_path, ConfigFile};
use locus::logging::{init_logging, LoggingGuard, LoggingOptions};

use crate::error::CliError;

/// Load the config file at `path`, or the default one.
pub fn load_config(path: Option<&Path>) -> Result<(PathBuf, ConfigFile), CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    let config = ConfigFile::load_from(&path)?;
    Ok((path, config))
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Application configuration derived from the config file
    app_config: AppConfig,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// When stdout is a TTY, stdout logging is disabled so log lines do not
    /// interleave with the interactive console.
    pub fn new(config_path: Option<&Path>, debug: bool) -> Result<Self, CliError> {
        let (_, config) = load_config(config_path)?;
        let app_config = AppConfig::from_config_file(&config);

        let options = LoggingOptions {
            stdout: !atty::is(atty::Stream::Stdout),
            debug,
        };
        let logging_guard = init_logging(&app_config.log_file, options)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            app_config,
        })
    }

    /// Get the application configuration.
    pub fn app_config(&self) -> &AppConfig {
        &self.app_config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Locus v{}", locus::VERSION);
        info!(
            preferences = %self.app_config.preferences_file.display(),
            "Locus CLI: {} command",
            command
        );
    }
}
