//! Commands processed by the coordinator task.
//!
//! Consumer calls, provider callbacks, provider completions, timers and
//! process entry points all arrive here, in one queue, and are handled one at
//! a time.

use tokio::sync::{oneshot, watch};

use super::error::{CancelOutcome, TrackingError};
use super::state::{CoordinatorSnapshot, SubscriptionId};
use crate::fix::LocationFix;
use crate::provider::ProviderError;

/// Process-level entry point into the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartCommand {
    /// Start, or re-enter, the coordinator.
    Start,
    /// Cancel tracking and stop the background presence.
    CancelTracking,
}

/// Who asked for a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOrigin {
    /// An attached consumer; the presence stays up.
    Consumer,
    /// The indicator's cancel action; the presence is terminated once the
    /// cancellation settles.
    Indicator,
}

/// Callback from the provider for one subscription.
#[derive(Debug)]
pub enum ProviderEvent {
    Fix(LocationFix),
    PermissionLost(ProviderError),
}

#[derive(Debug)]
pub enum Command {
    Subscribe {
        reply: oneshot::Sender<Result<(), TrackingError>>,
    },
    Unsubscribe {
        origin: CancelOrigin,
        reply: Option<oneshot::Sender<CancelOutcome>>,
    },
    Attach {
        reply: oneshot::Sender<watch::Receiver<Option<LocationFix>>>,
    },
    Detach {
        reconfiguration: bool,
    },
    Start(StartCommand),
    Provider {
        subscription: SubscriptionId,
        event: ProviderEvent,
    },
    CancelSettled {
        subscription: SubscriptionId,
        result: Result<(), ProviderError>,
    },
    ReattachGraceExpired {
        epoch: u64,
    },
    Snapshot {
        reply: oneshot::Sender<CoordinatorSnapshot>,
    },
}
