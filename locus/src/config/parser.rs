//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [tracking] section
    if let Some(section) = ini.section(Some("tracking")) {
        if let Some(v) = section.get("reattach_grace_ms") {
            config.tracking.reattach_grace_ms = parse_number(
                "tracking",
                "reattach_grace_ms",
                v,
                "must be a non-negative integer (milliseconds, 0 disables)",
            )?;
        }
        if let Some(v) = section.get("indicator_title") {
            let v = v.trim();
            if !v.is_empty() {
                config.tracking.indicator_title = v.to_string();
            }
        }
    }

    // [preferences] section
    if let Some(section) = ini.section(Some("preferences")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.preferences.file = expand_tilde(v);
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    // [simulation] section
    if let Some(section) = ini.section(Some("simulation")) {
        if let Some(v) = section.get("latitude") {
            let latitude: f64 =
                parse_number("simulation", "latitude", v, "must be a number in degrees")?;
            if !(-90.0..=90.0).contains(&latitude) {
                return Err(invalid("simulation", "latitude", v, "must be between -90 and 90"));
            }
            config.simulation.latitude = latitude;
        }
        if let Some(v) = section.get("longitude") {
            let longitude: f64 =
                parse_number("simulation", "longitude", v, "must be a number in degrees")?;
            if !(-180.0..=180.0).contains(&longitude) {
                return Err(invalid(
                    "simulation",
                    "longitude",
                    v,
                    "must be between -180 and 180",
                ));
            }
            config.simulation.longitude = longitude;
        }
        if let Some(v) = section.get("step_deg") {
            config.simulation.step_deg =
                parse_number("simulation", "step_deg", v, "must be a number in degrees")?;
        }
        if let Some(v) = section.get("heading_deg") {
            config.simulation.heading_deg =
                parse_number("simulation", "heading_deg", v, "must be a number in degrees")?;
        }
    }

    Ok(config)
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_partial_config() {
        let config = load(
            r#"
[tracking]
reattach_grace_ms = 250

[simulation]
heading_deg = 90
"#,
        )
        .unwrap();

        assert_eq!(config.tracking.reattach_grace_ms, 250);
        assert_eq!(config.tracking.indicator_title, "Locus");
        assert_eq!(config.simulation.heading_deg, 90.0);
        assert_eq!(config.simulation.latitude, 37.4);
    }

    #[test]
    fn test_invalid_grace() {
        let err = load(
            r#"
[tracking]
reattach_grace_ms = soon
"#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("tracking.reattach_grace_ms"));
        assert!(err.to_string().contains("'soon'"));
    }

    #[test]
    fn test_latitude_out_of_range() {
        let err = load(
            r#"
[simulation]
latitude = 91
"#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "latitude"
        ));
    }

    #[test]
    fn test_paths_expand_tilde() {
        let config = load(
            r#"
[preferences]
file = /tmp/locus-prefs.ini

[logging]
file = ~/custom/locus.log
"#,
        )
        .unwrap();

        assert_eq!(config.preferences.file, PathBuf::from("/tmp/locus-prefs.ini"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.logging.file, home.join("custom/locus.log"));
        }
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }
}
