//! INI-backed preference store.

use std::fs;
use std::path::{Path, PathBuf};

use ini::Ini;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{PreferenceError, PreferenceStore, PREFERENCES_SECTION, TRACKING_ENABLED_KEY};

/// A [`PreferenceStore`] persisted to a small INI file.
///
/// ```ini
/// [preferences]
/// location_foreground_tracking = true
/// ```
///
/// The value is cached after the first read. Writes go to a sibling temp file
/// that is renamed over the target, so a crash mid-write leaves the previous
/// value intact.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    cached: Mutex<bool>,
}

impl FilePreferenceStore {
    /// Open the store at `path`.
    ///
    /// A missing file reads as `false`. A value that is not a boolean also
    /// reads as `false` and is logged.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PreferenceError> {
        let path = path.into();
        let enabled = read_flag(&path)?;
        debug!(path = %path.display(), enabled, "Opened preference store");
        Ok(Self {
            path,
            cached: Mutex::new(enabled),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the flag from `path` without opening a store.
    ///
    /// Used by `locus status`, which must not hold a store open.
    pub fn peek(path: &Path) -> Result<bool, PreferenceError> {
        read_flag(path)
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self) -> bool {
        *self.cached.lock()
    }

    /// The cached value is updated even if the file write fails.
    fn set(&self, enabled: bool) -> Result<(), PreferenceError> {
        let mut cached = self.cached.lock();
        *cached = enabled;
        write_flag(&self.path, enabled)
    }
}

fn read_flag(path: &Path) -> Result<bool, PreferenceError> {
    if !path.exists() {
        return Ok(false);
    }

    let ini = Ini::load_from_file(path).map_err(|e| PreferenceError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let value = ini
        .section(Some(PREFERENCES_SECTION))
        .and_then(|section| section.get(TRACKING_ENABLED_KEY));

    Ok(match value.map(|v| v.trim().to_lowercase()) {
        None => false,
        Some(v) if v == "true" => true,
        Some(v) if v == "false" => false,
        Some(v) => {
            warn!(
                path = %path.display(),
                value = %v,
                "Ignoring invalid tracking preference, treating as disabled"
            );
            false
        }
    })
}

fn write_flag(path: &Path, enabled: bool) -> Result<(), PreferenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| PreferenceError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let mut ini = Ini::new();
    ini.with_section(Some(PREFERENCES_SECTION))
        .set(TRACKING_ENABLED_KEY, if enabled { "true" } else { "false" });

    let tmp = path.with_extension("ini.tmp");
    ini.write_to_file(&tmp)
        .and_then(|()| fs::rename(&tmp, path))
        .map_err(|source| PreferenceError::Write {
            path: path.to_path_buf(),
            source,
        })
}
