//! Location fixes.
//!
//! A [`LocationFix`] is a single position sample as reported by the provider.
//! Fixes are immutable once created; the coordinator keeps the most recent one
//! and hands clones to whichever delivery channel is active.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text shown when no fix has been received yet.
pub const NO_LOCATION_TEXT: &str = "Unknown Location";

/// A single position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// When the provider measured this position.
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    /// Create a fix stamped with the current time.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self::with_timestamp(latitude, longitude, Utc::now())
    }

    /// Create a fix with an explicit timestamp.
    pub fn with_timestamp(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Human-readable coordinates, e.g. `(37.4, -122.1)`.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LocationFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Describe an optional fix, falling back to [`NO_LOCATION_TEXT`].
pub fn describe(fix: Option<&LocationFix>) -> String {
    fix.map(LocationFix::to_text)
        .unwrap_or_else(|| NO_LOCATION_TEXT.to_string())
}
