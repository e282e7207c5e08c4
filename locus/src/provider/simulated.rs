//! Simulated location provider.
//!
//! Walks a straight line from a starting coordinate along a fixed heading,
//! emitting one fix per request interval. The permission can be granted and
//! revoked at runtime, and removal can be made slow or made to fail, which is
//! enough to exercise every path through the coordinator without platform
//! bindings.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use super::{
    FixSink, LocationProvider, LocationRequest, PendingRemoval, ProviderError, ProviderOperation,
    SubscriptionHandle,
};
use crate::fix::LocationFix;

/// Default starting latitude.
pub const DEFAULT_LATITUDE: f64 = 37.4;

/// Default starting longitude.
pub const DEFAULT_LONGITUDE: f64 = -122.1;

/// Default distance travelled per fix, in degrees.
pub const DEFAULT_STEP_DEG: f64 = 0.0001;

/// Default heading, in degrees clockwise from north.
pub const DEFAULT_HEADING_DEG: f64 = 45.0;

/// Configuration for [`SimulatedProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedProviderConfig {
    /// Starting latitude.
    pub latitude: f64,
    /// Starting longitude.
    pub longitude: f64,
    /// Distance travelled per fix, in degrees.
    pub step_deg: f64,
    /// Heading in degrees clockwise from north.
    pub heading_deg: f64,
    /// Emit fixes on a timer. When false, fixes are only produced by
    /// [`SimulatedProvider::emit`] and [`SimulatedProvider::emit_next`].
    pub emit: bool,
    /// How long a removal takes to settle.
    pub removal_delay: Duration,
}

impl Default for SimulatedProviderConfig {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            step_deg: DEFAULT_STEP_DEG,
            heading_deg: DEFAULT_HEADING_DEG,
            emit: true,
            removal_delay: Duration::ZERO,
        }
    }
}

impl SimulatedProviderConfig {
    /// A provider that only emits on demand, for deterministic tests.
    pub fn manual() -> Self {
        Self {
            emit: false,
            ..Self::default()
        }
    }

    /// Set the removal latency.
    pub fn with_removal_delay(mut self, delay: Duration) -> Self {
        self.removal_delay = delay;
        self
    }
}

struct ActiveRequest {
    sink: FixSink,
    request: LocationRequest,
    ticker: Option<JoinHandle<()>>,
}

struct SimState {
    permission_granted: bool,
    sync_removal_failure: bool,
    next_handle: u64,
    active: HashMap<SubscriptionHandle, ActiveRequest>,
    last_request: Option<LocationRequest>,
    latitude: f64,
    longitude: f64,
}

impl SimState {
    /// Advance one step along the heading and return the new position.
    fn advance(&mut self, step_deg: f64, heading_deg: f64) -> LocationFix {
        let heading = heading_deg.to_radians();
        self.latitude = (self.latitude + step_deg * heading.cos()).clamp(-90.0, 90.0);
        self.longitude += step_deg * heading.sin();
        if self.longitude > 180.0 {
            self.longitude -= 360.0;
        } else if self.longitude < -180.0 {
            self.longitude += 360.0;
        }
        LocationFix::new(self.latitude, self.longitude)
    }
}

/// A [`LocationProvider`] that fabricates a moving position.
///
/// Cloning is cheap; clones share the same state, so a test can keep one
/// clone for control while the coordinator owns another.
#[derive(Clone)]
pub struct SimulatedProvider {
    config: SimulatedProviderConfig,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedProvider {
    /// Create a provider with the permission granted.
    pub fn new(config: SimulatedProviderConfig) -> Self {
        let state = SimState {
            permission_granted: true,
            sync_removal_failure: false,
            next_handle: 1,
            active: HashMap::new(),
            last_request: None,
            latitude: config.latitude,
            longitude: config.longitude,
        };
        Self {
            config,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Grant the location permission.
    pub fn grant_permission(&self) {
        self.state.lock().permission_granted = true;
        info!("Simulated provider: permission granted");
    }

    /// Revoke the location permission.
    ///
    /// Active requests stay registered but stop emitting; removing them will
    /// fail until the permission is granted again.
    pub fn revoke_permission(&self) {
        self.state.lock().permission_granted = false;
        info!("Simulated provider: permission revoked");
    }

    /// Whether the permission is currently granted.
    pub fn has_permission(&self) -> bool {
        self.state.lock().permission_granted
    }

    /// Make removals fail synchronously instead of through the pending
    /// future while the permission is revoked.
    pub fn set_sync_removal_failure(&self, enabled: bool) {
        self.state.lock().sync_removal_failure = enabled;
    }

    /// Deliver `fix` to every active request.
    ///
    /// Returns the number of sinks that accepted it.
    pub fn emit(&self, fix: LocationFix) -> usize {
        let sinks = self.sinks();
        sinks.iter().filter(|sink| sink.deliver(fix)).count()
    }

    /// Advance the simulated position and deliver it.
    pub fn emit_next(&self) -> LocationFix {
        let fix = self
            .state
            .lock()
            .advance(self.config.step_deg, self.config.heading_deg);
        self.emit(fix);
        fix
    }

    /// Fail every active stream with a permission error.
    ///
    /// The requests are dropped on the provider side, as a platform would do
    /// when the permission disappears under a running stream.
    pub fn report_permission_lost(&self) {
        let drained: Vec<ActiveRequest> = {
            let mut state = self.state.lock();
            state.permission_granted = false;
            state.active.drain().map(|(_, active)| active).collect()
        };
        for active in drained {
            if let Some(ticker) = active.ticker {
                ticker.abort();
            }
            active.sink.permission_lost();
        }
        info!("Simulated provider: streams failed with permission loss");
    }

    /// Number of requests currently registered.
    pub fn active_requests(&self) -> usize {
        self.state.lock().active.len()
    }

    /// The most recent request accepted.
    pub fn last_request(&self) -> Option<LocationRequest> {
        self.state.lock().last_request
    }

    fn sinks(&self) -> Vec<FixSink> {
        self.state
            .lock()
            .active
            .values()
            .map(|active| active.sink.clone())
            .collect()
    }

    fn spawn_ticker(&self, interval: Duration, sink: FixSink) -> Option<JoinHandle<()>> {
        if !self.config.emit {
            return None;
        }
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let state = Arc::clone(&self.state);
        let step_deg = self.config.step_deg;
        let heading_deg = self.config.heading_deg;

        Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let fix = {
                    let mut state = state.lock();
                    if !state.permission_granted {
                        continue;
                    }
                    state.advance(step_deg, heading_deg)
                };
                if !sink.deliver(fix) {
                    trace!("Simulated provider: sink closed, stopping ticker");
                    break;
                }
            }
        }))
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(SimulatedProviderConfig::default())
    }
}

impl LocationProvider for SimulatedProvider {
    fn request_updates(
        &self,
        request: &LocationRequest,
        sink: FixSink,
    ) -> Result<SubscriptionHandle, ProviderError> {
        let handle = {
            let mut state = self.state.lock();
            if !state.permission_granted {
                return Err(ProviderError::permission_denied(
                    ProviderOperation::RequestUpdates,
                ));
            }
            let handle = SubscriptionHandle::new(state.next_handle);
            state.next_handle += 1;
            state.last_request = Some(*request);
            handle
        };

        let ticker = self.spawn_ticker(request.interval, sink.clone());
        self.state.lock().active.insert(
            handle,
            ActiveRequest {
                sink,
                request: *request,
                ticker,
            },
        );

        debug!(
            handle = %handle,
            interval_ms = request.interval.as_millis() as u64,
            accuracy = %request.accuracy,
            "Simulated provider: updates requested"
        );
        Ok(handle)
    }

    fn remove_updates(&self, handle: SubscriptionHandle) -> Result<PendingRemoval, ProviderError> {
        let delay = self.config.removal_delay;
        let mut state = self.state.lock();

        if !state.permission_granted {
            if state.sync_removal_failure {
                return Err(ProviderError::permission_denied(
                    ProviderOperation::RemoveUpdates,
                ));
            }
            return Ok(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Err(ProviderError::permission_denied(
                    ProviderOperation::RemoveUpdates,
                ))
            }
            .boxed());
        }

        if let Some(active) = state.active.remove(&handle) {
            if let Some(ticker) = active.ticker {
                ticker.abort();
            }
            debug!(
                handle = %handle,
                interval_ms = active.request.interval.as_millis() as u64,
                "Simulated provider: updates removed"
            );
        }

        Ok(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(())
        }
        .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{Command, ProviderEvent, SubscriptionId};
    use tokio::sync::mpsc;

    fn sink() -> (FixSink, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (FixSink::new(SubscriptionId::new(7), tx), rx)
    }

    #[test]
    fn test_request_requires_permission() {
        let provider = SimulatedProvider::new(SimulatedProviderConfig::manual());
        provider.revoke_permission();
        let (sink, _rx) = sink();

        let result = provider.request_updates(&LocationRequest::foreground(), sink);
        assert_eq!(
            result,
            Err(ProviderError::permission_denied(
                ProviderOperation::RequestUpdates
            ))
        );
        assert_eq!(provider.active_requests(), 0);
    }

    #[test]
    fn test_emit_reaches_sink() {
        let provider = SimulatedProvider::new(SimulatedProviderConfig::manual());
        let (sink, mut rx) = sink();
        provider
            .request_updates(&LocationRequest::foreground(), sink)
            .unwrap();

        let fix = provider.emit_next();
        match rx.try_recv().unwrap() {
            Command::Provider {
                subscription,
                event: ProviderEvent::Fix(received),
            } => {
                assert_eq!(subscription, SubscriptionId::new(7));
                assert_eq!(received, fix);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_emit_next_moves_along_heading() {
        let provider = SimulatedProvider::new(SimulatedProviderConfig::manual());
        let first = provider.emit_next();
        let second = provider.emit_next();
        assert!(second.latitude > first.latitude);
        assert!(second.longitude > first.longitude);
    }

    #[tokio::test]
    async fn test_remove_with_permission_succeeds() {
        let provider = SimulatedProvider::new(SimulatedProviderConfig::manual());
        let (sink, _rx) = sink();
        let handle = provider
            .request_updates(&LocationRequest::foreground(), sink)
            .unwrap();

        let pending = provider.remove_updates(handle).unwrap();
        assert_eq!(provider.active_requests(), 0);
        assert_eq!(pending.await, Ok(()));
    }

    #[tokio::test]
    async fn test_remove_without_permission_fails_later() {
        let provider = SimulatedProvider::new(SimulatedProviderConfig::manual());
        let (sink, _rx) = sink();
        let handle = provider
            .request_updates(&LocationRequest::foreground(), sink)
            .unwrap();
        provider.revoke_permission();

        let pending = provider.remove_updates(handle).unwrap();
        assert!(pending.await.is_err());
        assert_eq!(provider.active_requests(), 1);
    }

    #[test]
    fn test_remove_without_permission_can_fail_synchronously() {
        let provider = SimulatedProvider::new(SimulatedProviderConfig::manual());
        let (sink, _rx) = sink();
        let handle = provider
            .request_updates(&LocationRequest::foreground(), sink)
            .unwrap();
        provider.revoke_permission();
        provider.set_sync_removal_failure(true);

        assert!(provider.remove_updates(handle).is_err());
    }

    #[test]
    fn test_report_permission_lost_notifies_and_drops() {
        let provider = SimulatedProvider::new(SimulatedProviderConfig::manual());
        let (sink, mut rx) = sink();
        provider
            .request_updates(&LocationRequest::foreground(), sink)
            .unwrap();

        provider.report_permission_lost();
        assert_eq!(provider.active_requests(), 0);
        assert!(!provider.has_permission());
        assert!(matches!(
            rx.try_recv().unwrap(),
            Command::Provider {
                event: ProviderEvent::PermissionLost(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_ticker_emits_on_interval() {
        let provider = SimulatedProvider::default();
        let (sink, mut rx) = sink();
        let request = LocationRequest {
            interval: Duration::from_millis(20),
            ..LocationRequest::foreground()
        };
        provider.request_updates(&request, sink).unwrap();

        let command = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("ticker should emit")
            .unwrap();
        assert!(matches!(
            command,
            Command::Provider {
                event: ProviderEvent::Fix(_),
                ..
            }
        ));
    }
}
