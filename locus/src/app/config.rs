//! Application configuration for [`LocationServiceHost`](super::LocationServiceHost).
//!
//! Combines everything needed to wire a coordinator: coordinator behaviour,
//! where the tracking preference lives, where logs go and how the simulated
//! provider moves.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigFile;
use crate::coordinator::CoordinatorConfig;
use crate::provider::{LocationRequest, SimulatedProviderConfig};

/// Top-level configuration combining all component configs.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Coordinator configuration.
    pub coordinator: CoordinatorConfig,

    /// File holding the persisted tracking preference.
    pub preferences_file: PathBuf,

    /// Log file path.
    pub log_file: PathBuf,

    /// Simulated provider configuration.
    pub simulation: SimulatedProviderConfig,
}

impl AppConfig {
    /// Build from a loaded config file.
    ///
    /// A `reattach_grace_ms` of 0 disables the reconfiguration grace timer.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let reattach_grace = match config.tracking.reattach_grace_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        Self {
            coordinator: CoordinatorConfig {
                request: LocationRequest::foreground(),
                reattach_grace,
                indicator_title: config.tracking.indicator_title.clone(),
            },
            preferences_file: config.preferences.file.clone(),
            log_file: config.logging.file.clone(),
            simulation: SimulatedProviderConfig {
                latitude: config.simulation.latitude,
                longitude: config.simulation.longitude,
                step_deg: config.simulation.step_deg,
                heading_deg: config.simulation.heading_deg,
                ..SimulatedProviderConfig::default()
            },
        }
    }

    /// Store the tracking preference at `path`.
    pub fn with_preferences_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.preferences_file = path.into();
        self
    }

    /// Override the simulated provider's removal latency.
    pub fn with_removal_delay(mut self, delay: Duration) -> Self {
        self.simulation.removal_delay = delay;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_config_file(&ConfigFile::default())
    }
}
