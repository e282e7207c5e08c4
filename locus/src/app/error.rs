//! Application error types.

use std::fmt;

use crate::config::ConfigFileError;
use crate::coordinator::TrackingError;
use crate::preferences::PreferenceError;

/// Errors that can occur during application lifecycle.
#[derive(Debug)]
pub enum AppError {
    /// Failed to open the preference store.
    Preferences(PreferenceError),

    /// The coordinator rejected a command.
    Coordinator(TrackingError),

    /// Configuration error.
    Config(String),

    /// Failed to create the Tokio runtime.
    RuntimeCreation(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Preferences(e) => {
                write!(f, "Failed to open preference store: {}", e)
            }
            AppError::Coordinator(e) => {
                write!(f, "Tracking coordinator error: {}", e)
            }
            AppError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            AppError::RuntimeCreation(msg) => {
                write!(f, "Failed to create Tokio runtime: {}", msg)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Preferences(e) => Some(e),
            AppError::Coordinator(e) => Some(e),
            AppError::Config(_) => None,
            AppError::RuntimeCreation(_) => None,
        }
    }
}

impl From<PreferenceError> for AppError {
    fn from(e: PreferenceError) -> Self {
        AppError::Preferences(e)
    }
}

impl From<TrackingError> for AppError {
    fn from(e: TrackingError) -> Self {
        AppError::Coordinator(e)
    }
}

impl From<ConfigFileError> for AppError {
    fn from(e: ConfigFileError) -> Self {
        AppError::Config(e.to_string())
    }
}
