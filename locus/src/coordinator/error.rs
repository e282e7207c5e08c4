//! Coordinator error and outcome types.

use thiserror::Error;

use crate::provider::ProviderError;

/// Errors surfaced to callers of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    /// The provider refused because the location permission is missing.
    #[error("location permission lost: {0}")]
    PermissionLost(#[source] ProviderError),

    /// A subscribe that was waiting for a cancellation to settle was
    /// overtaken by a later unsubscribe.
    #[error("subscribe superseded by a later unsubscribe")]
    Superseded,

    /// The coordinator task is no longer running.
    #[error("tracking coordinator is not running")]
    CoordinatorStopped,
}

/// How a cancellation settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The provider removed the subscription.
    Removed,
    /// There was no subscription to remove.
    NothingActive,
    /// The provider could not remove the subscription; it is still live and
    /// the tracking preference was restored.
    PermissionLost,
    /// The coordinator stopped before the cancellation settled.
    Abandoned,
}

impl CancelOutcome {
    /// Whether tracking is known to be off after this outcome.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Removed | Self::NothingActive)
    }
}
