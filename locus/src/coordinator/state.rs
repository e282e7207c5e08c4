//! Coordinator state types.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::fix::LocationFix;
use crate::provider::{LocationRequest, SubscriptionHandle};

/// Default grace period for a reconfiguration detach to be followed by an
/// attach.
pub const DEFAULT_REATTACH_GRACE: Duration = Duration::from_millis(5000);

/// Default indicator title.
pub const DEFAULT_INDICATOR_TITLE: &str = "Locus";

/// Where fixes currently go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentState {
    /// A consumer is attached; fixes are delivered directly.
    Attached,
    /// No consumer; tracking continues and fixes go to the indicator.
    DetachedRunningBackground,
    /// No consumer and no background work.
    DetachedIdle,
}

impl fmt::Display for AttachmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attached => write!(f, "attached"),
            Self::DetachedRunningBackground => write!(f, "background"),
            Self::DetachedIdle => write!(f, "idle"),
        }
    }
}

/// Whether the coordinator is resident as a background service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Resident,
    Stopped,
}

/// Coordinator-local identifier for one subscription.
///
/// A fresh id is minted for every provider request, so fixes still in flight
/// from a cancelled request can be told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A live subscription to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingSubscription {
    pub id: SubscriptionId,
    pub request: LocationRequest,
    pub handle: SubscriptionHandle,
}

/// Coordinator configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Request issued on every subscribe.
    pub request: LocationRequest,
    /// How long a reconfiguration detach may wait for the matching attach.
    /// `None` waits forever.
    pub reattach_grace: Option<Duration>,
    /// Title of the background indicator.
    pub indicator_title: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            request: LocationRequest::foreground(),
            reattach_grace: Some(DEFAULT_REATTACH_GRACE),
            indicator_title: DEFAULT_INDICATOR_TITLE.to_string(),
        }
    }
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatorSnapshot {
    pub attachment: AttachmentState,
    /// A subscription exists.
    pub tracking: bool,
    /// A cancellation is waiting for the provider.
    pub cancel_pending: bool,
    /// The last detach was a reconfiguration.
    pub reconfiguring: bool,
    pub latest_fix: Option<LocationFix>,
    pub indicator_visible: bool,
    /// Tracking preference as last written, even if the store refused it.
    pub tracking_preference: bool,
    pub presence: Presence,
    /// Fixes accepted since startup.
    pub fixes_received: u64,
}
