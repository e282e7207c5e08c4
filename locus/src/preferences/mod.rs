//! Durable "tracking enabled" preference.
//!
//! The coordinator records its intent to track in a [`PreferenceStore`]
//! before it talks to the provider, and clears it when tracking is cancelled.
//! At every quiescent point the stored value equals "a subscription exists".
//!
//! Two stores are provided:
//!
//! - [`MemoryPreferenceStore`] - process-local, for tests and embedding
//! - [`FilePreferenceStore`] - INI file that survives restarts
//!
//! [`ReadOnlyPreferenceStore`] rejects every write, for exercising write
//! failures.

mod file;

pub use file::FilePreferenceStore;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use thiserror::Error;

/// Key under which the tracking flag is stored.
pub const TRACKING_ENABLED_KEY: &str = "location_foreground_tracking";

/// INI section holding the tracking flag.
pub const PREFERENCES_SECTION: &str = "preferences";

/// Errors from a preference store.
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// The backing file could not be read or parsed.
    #[error("Failed to read preferences from {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// The backing file could not be written.
    #[error("Failed to write preferences to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory for the backing file could not be created.
    #[error("Failed to create preferences directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A durable boolean flag.
///
/// `get` never fails: an unreadable or missing value reads as `false`.
/// `set` has read-your-own-write semantics within the process.
pub trait PreferenceStore: Send + Sync + 'static {
    /// Current value of the tracking flag.
    fn get(&self) -> bool;

    /// Store the tracking flag.
    fn set(&self, enabled: bool) -> Result<(), PreferenceError>;
}

/// In-memory [`PreferenceStore`].
///
/// Counts writes so tests can assert that idempotent operations do not touch
/// the store.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    enabled: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryPreferenceStore {
    /// Create a store with the flag cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with an initial value, as if left over from a previous run.
    pub fn with_value(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `set` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set(&self, enabled: bool) -> Result<(), PreferenceError> {
        self.enabled.store(enabled, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A [`PreferenceStore`] whose writes always fail.
///
/// `get` keeps returning the initial value. Stands in for a store on a full
/// or read-only disk.
#[derive(Debug, Default)]
pub struct ReadOnlyPreferenceStore {
    enabled: bool,
    attempts: AtomicUsize,
}

impl ReadOnlyPreferenceStore {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Number of rejected `set` calls so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl PreferenceStore for ReadOnlyPreferenceStore {
    fn get(&self) -> bool {
        self.enabled
    }

    fn set(&self, _enabled: bool) -> Result<(), PreferenceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(PreferenceError::Write {
            path: PathBuf::from("<read-only>"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "store is read-only"),
        })
    }
}
