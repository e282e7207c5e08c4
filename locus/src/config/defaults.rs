//! Default configuration values.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::{
    ConfigFile, LoggingSettings, PreferencesSettings, SimulationSettings, TrackingSettings,
};
use crate::coordinator::{DEFAULT_INDICATOR_TITLE, DEFAULT_REATTACH_GRACE};
use crate::provider::{DEFAULT_HEADING_DEG, DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_STEP_DEG};

/// Default reconfiguration grace, in milliseconds.
pub const DEFAULT_REATTACH_GRACE_MS: u64 = DEFAULT_REATTACH_GRACE.as_millis() as u64;

/// Default preferences file name, inside the config directory.
pub const DEFAULT_PREFERENCES_FILE: &str = "preferences.ini";

/// Default log file name, inside the `logs` subdirectory.
pub const DEFAULT_LOG_FILE: &str = "locus.log";

/// Default path of the preferences file (`~/.locus/preferences.ini`).
pub fn default_preferences_file() -> PathBuf {
    config_directory().join(DEFAULT_PREFERENCES_FILE)
}

/// Default path of the log file (`~/.locus/logs/locus.log`).
pub fn default_log_file() -> PathBuf {
    config_directory().join("logs").join(DEFAULT_LOG_FILE)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            tracking: TrackingSettings {
                reattach_grace_ms: DEFAULT_REATTACH_GRACE_MS,
                indicator_title: DEFAULT_INDICATOR_TITLE.to_string(),
            },
            preferences: PreferencesSettings {
                file: default_preferences_file(),
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
            simulation: SimulationSettings {
                latitude: DEFAULT_LATITUDE,
                longitude: DEFAULT_LONGITUDE,
                step_deg: DEFAULT_STEP_DEG,
                heading_deg: DEFAULT_HEADING_DEG,
            },
        }
    }
}
