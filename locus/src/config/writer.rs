//! INI serialization: `ConfigFile` → commented INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[tracking]
; How long (ms) a reconfiguration detach waits for the consumer to re-attach
; before tracking moves to the background. 0 waits forever. (default: 5000)
reattach_grace_ms = {}
; Title of the background indicator
indicator_title = {}

[preferences]
; File holding the persisted "tracking enabled" flag
file = {}

[logging]
; Log file, truncated at the start of every session
file = {}

[simulation]
; Starting position of the simulated provider, in degrees
latitude = {}
longitude = {}
; Distance travelled per fix, in degrees
step_deg = {}
; Direction of travel, degrees clockwise from north
heading_deg = {}
"#,
        config.tracking.reattach_grace_ms,
        config.tracking.indicator_title,
        path_to_string(&config.preferences.file),
        path_to_string(&config.logging.file),
        config.simulation.latitude,
        config.simulation.longitude,
        config.simulation.step_deg,
        config.simulation.heading_deg,
    )
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
