//! Settings structs, one per `[section]` of the INI file.

use std::path::PathBuf;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Coordinator behaviour
    pub tracking: TrackingSettings,
    /// Tracking preference storage
    pub preferences: PreferencesSettings,
    /// Log output
    pub logging: LoggingSettings,
    /// Simulated provider
    pub simulation: SimulationSettings,
}

/// `[tracking]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSettings {
    /// How long a reconfiguration detach waits for a re-attach, in
    /// milliseconds. 0 waits forever.
    pub reattach_grace_ms: u64,
    /// Title shown on the background indicator
    pub indicator_title: String,
}

/// `[preferences]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferencesSettings {
    /// File holding the persisted tracking flag
    pub file: PathBuf,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

/// `[simulation]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    /// Starting latitude
    pub latitude: f64,
    /// Starting longitude
    pub longitude: f64,
    /// Degrees travelled per fix
    pub step_deg: f64,
    /// Heading in degrees clockwise from north
    pub heading_deg: f64,
}
