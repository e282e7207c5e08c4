//! Location provider abstraction.
//!
//! The provider is an external capability: it accepts a [`LocationRequest`]
//! together with a [`FixSink`], and later pushes fixes (or a permission
//! failure) into that sink from whatever execution context it likes. The sink
//! routes everything back into the coordinator's command queue, so provider
//! callbacks never race with consumer calls.
//!
//! Removal is asynchronous: [`LocationProvider::remove_updates`] either fails
//! immediately or returns a [`PendingRemoval`] future that resolves once the
//! provider has settled the cancellation.
//!
//! # Implementations
//!
//! - [`SimulatedProvider`] - emits fixes along a straight heading; used by the
//!   CLI and by tests

mod simulated;

pub use simulated::{
    SimulatedProvider, SimulatedProviderConfig, DEFAULT_HEADING_DEG, DEFAULT_LATITUDE,
    DEFAULT_LONGITUDE, DEFAULT_STEP_DEG,
};

use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::coordinator::{Command, ProviderEvent, SubscriptionId};
use crate::fix::LocationFix;

/// Requested interval between fixes.
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(600);

/// Fastest interval at which fixes are accepted.
pub const FASTEST_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

/// Accuracy class requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accuracy {
    /// Most precise fixes available (GPS).
    #[default]
    High,
    /// Block-level accuracy.
    Balanced,
    /// City-level accuracy.
    LowPower,
    /// Only fixes requested by someone else.
    Passive,
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Balanced => write!(f, "balanced"),
            Self::LowPower => write!(f, "low-power"),
            Self::Passive => write!(f, "passive"),
        }
    }
}

/// Parameters of a subscription request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    /// Desired sampling interval.
    pub interval: Duration,
    /// Fastest interval the subscriber can cope with.
    pub fastest_interval: Duration,
    /// Accuracy class.
    pub accuracy: Accuracy,
}

impl LocationRequest {
    /// The fixed request used for foreground tracking.
    pub const fn foreground() -> Self {
        Self {
            interval: UPDATE_INTERVAL,
            fastest_interval: FASTEST_UPDATE_INTERVAL,
            accuracy: Accuracy::High,
        }
    }
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self::foreground()
    }
}

/// Provider-issued handle for an active request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    /// Wrap a provider-specific identifier.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The provider-specific identifier.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle-{}", self.0)
    }
}

/// The provider operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderOperation {
    RequestUpdates,
    RemoveUpdates,
    Streaming,
}

impl fmt::Display for ProviderOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestUpdates => write!(f, "requesting updates"),
            Self::RemoveUpdates => write!(f, "removing updates"),
            Self::Streaming => write!(f, "streaming updates"),
        }
    }
}

/// Errors reported by a location provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The location permission is missing or was revoked.
    #[error("location permission denied while {operation}")]
    PermissionDenied { operation: ProviderOperation },
}

impl ProviderError {
    pub fn permission_denied(operation: ProviderOperation) -> Self {
        Self::PermissionDenied { operation }
    }
}

/// Asynchronous completion of a removal request.
pub type PendingRemoval = BoxFuture<'static, Result<(), ProviderError>>;

/// Destination for provider callbacks.
///
/// Each sink is bound to one subscription. Deliveries after the coordinator
/// has gone away are silently dropped; the return value tells the provider
/// whether anyone is still listening.
#[derive(Clone)]
pub struct FixSink {
    subscription: SubscriptionId,
    commands: mpsc::UnboundedSender<Command>,
}

impl FixSink {
    pub(crate) fn new(
        subscription: SubscriptionId,
        commands: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            subscription,
            commands,
        }
    }

    /// Deliver a fix. Returns false once the coordinator is gone.
    pub fn deliver(&self, fix: LocationFix) -> bool {
        self.send(ProviderEvent::Fix(fix))
    }

    /// Report that the stream stopped because the permission was revoked.
    pub fn permission_lost(&self) -> bool {
        self.send(ProviderEvent::PermissionLost(ProviderError::permission_denied(
            ProviderOperation::Streaming,
        )))
    }

    /// Whether the receiving coordinator has shut down.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn send(&self, event: ProviderEvent) -> bool {
        self.commands
            .send(Command::Provider {
                subscription: self.subscription,
                event,
            })
            .is_ok()
    }
}

impl fmt::Debug for FixSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixSink")
            .field("subscription", &self.subscription)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Platform location capability.
pub trait LocationProvider: Send + Sync + 'static {
    /// Start delivering fixes for `request` into `sink`.
    ///
    /// Fails synchronously when the permission is missing.
    fn request_updates(
        &self,
        request: &LocationRequest,
        sink: FixSink,
    ) -> Result<SubscriptionHandle, ProviderError>;

    /// Ask the provider to stop delivering fixes for `handle`.
    ///
    /// An `Err` means the provider refused outright; otherwise the returned
    /// future resolves once the provider has settled the cancellation, which
    /// may itself fail if the permission was lost in the meantime.
    fn remove_updates(&self, handle: SubscriptionHandle) -> Result<PendingRemoval, ProviderError>;
}
