//! Bridge between the coordinator and its attached consumer.

use tokio::sync::watch;
use tracing::trace;

use super::handle::CoordinatorHandle;
use crate::fix::LocationFix;

/// Coordinator side of the consumer bridge.
///
/// A single-slot channel: a slow consumer only ever sees the latest fix, and
/// pushing while nobody listens is a silent no-op.
pub(crate) struct ConsumerLink {
    slot: watch::Sender<Option<LocationFix>>,
}

impl ConsumerLink {
    pub(crate) fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot }
    }

    /// A receiver for a newly attached consumer, primed with `latest`.
    pub(crate) fn subscribe(
        &self,
        latest: Option<LocationFix>,
    ) -> watch::Receiver<Option<LocationFix>> {
        self.slot.send_replace(latest);
        self.slot.subscribe()
    }

    pub(crate) fn push(&self, fix: LocationFix) {
        self.slot.send_replace(Some(fix));
        if self.slot.receiver_count() == 0 {
            trace!("Fix pushed with no consumer listening");
        }
    }
}

/// Consumer side of the bridge, returned by [`CoordinatorHandle::attach`].
///
/// Dropping a session without calling [`detach`](Self::detach) counts as a
/// genuine detach.
pub struct ConsumerSession {
    handle: CoordinatorHandle,
    fixes: watch::Receiver<Option<LocationFix>>,
    attached: bool,
}

impl ConsumerSession {
    pub(crate) fn new(
        handle: CoordinatorHandle,
        fixes: watch::Receiver<Option<LocationFix>>,
    ) -> Self {
        Self {
            handle,
            fixes,
            attached: true,
        }
    }

    /// The coordinator this session is attached to, for subscribe and
    /// unsubscribe calls.
    pub fn coordinator(&self) -> &CoordinatorHandle {
        &self.handle
    }

    /// The latest fix known at attach time or delivered since.
    pub fn latest(&self) -> Option<LocationFix> {
        *self.fixes.borrow()
    }

    /// Wait for the next directly delivered fix.
    ///
    /// Returns `None` once the coordinator has stopped.
    pub async fn next_fix(&mut self) -> Option<LocationFix> {
        loop {
            self.fixes.changed().await.ok()?;
            if let Some(fix) = *self.fixes.borrow_and_update() {
                return Some(fix);
            }
        }
    }

    /// Detach from the coordinator.
    ///
    /// With `reconfiguration` set, the coordinator keeps treating the
    /// consumer as attached and expects a prompt re-attach.
    pub fn detach(mut self, reconfiguration: bool) {
        self.attached = false;
        self.handle.detach(reconfiguration);
    }

    /// Shorthand for `detach(true)`.
    pub fn detach_for_reconfiguration(self) {
        self.detach(true);
    }
}

impl Drop for ConsumerSession {
    fn drop(&mut self) {
        if self.attached {
            self.handle.detach(false);
        }
    }
}
