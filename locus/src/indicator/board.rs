//! In-memory indicator registry.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{IndicatorActions, IndicatorChannel, IndicatorContent, IndicatorHandle};

/// Snapshot of a posted indicator.
#[derive(Debug, Clone)]
pub struct PostedIndicator {
    pub handle: IndicatorHandle,
    pub title: String,
    pub body: String,
    pub actions: IndicatorActions,
}

#[derive(Default)]
struct Counters {
    posts: AtomicUsize,
    updates: AtomicUsize,
    dismissals: AtomicUsize,
}

/// An [`IndicatorChannel`] that keeps posted indicators in memory.
///
/// Clones share the same registry. Used directly in tests and wrapped by the
/// terminal indicator in the CLI.
#[derive(Clone, Default)]
pub struct IndicatorBoard {
    next_handle: Arc<AtomicU64>,
    live: Arc<Mutex<BTreeMap<u64, PostedIndicator>>>,
    counters: Arc<Counters>,
}

impl IndicatorBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indicators currently posted.
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    /// The most recently posted indicator that is still live.
    pub fn current(&self) -> Option<PostedIndicator> {
        self.live.lock().values().next_back().cloned()
    }

    pub fn posts(&self) -> usize {
        self.counters.posts.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.counters.updates.load(Ordering::SeqCst)
    }

    pub fn dismissals(&self) -> usize {
        self.counters.dismissals.load(Ordering::SeqCst)
    }

    /// Press the cancel action on the current indicator.
    ///
    /// Returns false if nothing is posted or the coordinator has stopped.
    pub fn trigger_cancel(&self) -> bool {
        self.current()
            .map(|posted| posted.actions.cancel())
            .unwrap_or(false)
    }

    /// Press the launch action on the current indicator.
    pub fn trigger_launch(&self) -> bool {
        self.current()
            .map(|posted| posted.actions.launch())
            .unwrap_or(false)
    }
}

impl IndicatorChannel for IndicatorBoard {
    fn post(&self, content: IndicatorContent) -> IndicatorHandle {
        let handle = IndicatorHandle::new(self.next_handle.fetch_add(1, Ordering::SeqCst) + 1);
        debug!(handle = handle.raw(), body = %content.body, "Indicator posted");

        self.live.lock().insert(
            handle.raw(),
            PostedIndicator {
                handle,
                title: content.title,
                body: content.body,
                actions: content.actions,
            },
        );
        self.counters.posts.fetch_add(1, Ordering::SeqCst);
        handle
    }

    fn update(&self, handle: IndicatorHandle, body: &str) {
        let mut live = self.live.lock();
        match live.get_mut(&handle.raw()) {
            Some(posted) => {
                posted.body = body.to_string();
                self.counters.updates.fetch_add(1, Ordering::SeqCst);
                trace!(handle = handle.raw(), body, "Indicator updated");
            }
            None => trace!(handle = handle.raw(), "Update for dismissed indicator ignored"),
        }
    }

    fn dismiss(&self, handle: IndicatorHandle) {
        if self.live.lock().remove(&handle.raw()).is_some() {
            self.counters.dismissals.fetch_add(1, Ordering::SeqCst);
            debug!(handle = handle.raw(), "Indicator dismissed");
        }
    }
}
