//! Integration tests for the tracking coordinator.
//!
//! These tests drive a coordinator running on its own task through the
//! public handle, with the simulated provider, the in-memory indicator board
//! and an in-memory preference store:
//! - Attach/detach transitions and indicator visibility
//! - Preference reconciliation when the provider refuses
//! - Cancellation from the indicator and across restarts
//!
//! Run with: `cargo test --test coordinator_integration`

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use locus::coordinator::{
    AttachmentState, CancelOutcome, CoordinatorConfig, CoordinatorHandle, CoordinatorSnapshot,
    Presence, StartCommand, TrackingCoordinator, TrackingError,
};
use locus::fix::LocationFix;
use locus::indicator::IndicatorBoard;
use locus::preferences::{
    FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, ReadOnlyPreferenceStore,
};
use locus::provider::{SimulatedProvider, SimulatedProviderConfig};

// ============================================================================
// Helper Functions
// ============================================================================

struct Rig {
    handle: CoordinatorHandle,
    provider: SimulatedProvider,
    board: IndicatorBoard,
    prefs: Arc<MemoryPreferenceStore>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl Rig {
    fn spawn(prefs: Arc<MemoryPreferenceStore>, provider_config: SimulatedProviderConfig) -> Self {
        Self::spawn_with(prefs, provider_config, CoordinatorConfig::default())
    }

    fn spawn_with(
        prefs: Arc<MemoryPreferenceStore>,
        provider_config: SimulatedProviderConfig,
        config: CoordinatorConfig,
    ) -> Self {
        let provider = SimulatedProvider::new(provider_config);
        let board = IndicatorBoard::new();
        let (coordinator, handle) = TrackingCoordinator::new(
            config,
            Arc::new(provider.clone()),
            Arc::new(board.clone()),
            prefs.clone(),
        );
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(coordinator.run(shutdown.clone()));

        Self {
            handle,
            provider,
            board,
            prefs,
            shutdown,
            task,
        }
    }

    fn idle() -> Self {
        Self::spawn(
            Arc::new(MemoryPreferenceStore::new()),
            SimulatedProviderConfig::manual(),
        )
    }

    /// Snapshot once no cancellation is in flight.
    async fn quiesce(&self) -> CoordinatorSnapshot {
        for _ in 0..200 {
            let snapshot = self.handle.snapshot().await.unwrap();
            if !snapshot.cancel_pending {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("coordinator did not quiesce");
    }

    async fn stop(self) {
        self.shutdown.cancel();
        self.task.await.unwrap();
    }
}

/// Run a coordinator over an arbitrary preference store.
fn spawn_over(
    store: Arc<dyn PreferenceStore>,
) -> (CoordinatorHandle, SimulatedProvider, IndicatorBoard, CancellationToken) {
    let provider = SimulatedProvider::new(SimulatedProviderConfig::manual());
    let board = IndicatorBoard::new();
    let (coordinator, handle) = TrackingCoordinator::new(
        CoordinatorConfig::default(),
        Arc::new(provider.clone()),
        Arc::new(board.clone()),
        store,
    );
    let shutdown = CancellationToken::new();
    tokio::spawn(coordinator.run(shutdown.clone()));
    (handle, provider, board, shutdown)
}

// ============================================================================
// Scenarios
// ============================================================================

/// Subscribing while idle and then leaving posts the placeholder indicator.
#[tokio::test]
async fn test_subscribe_from_idle_then_detach_posts_placeholder() {
    let rig = Rig::idle();

    rig.handle.subscribe().await.unwrap();
    let session = rig.handle.attach().await.unwrap();
    session.detach(false);

    let snapshot = rig.quiesce().await;
    assert_eq!(snapshot.attachment, AttachmentState::DetachedRunningBackground);
    assert_eq!(rig.board.live_count(), 1);
    assert_eq!(rig.board.current().unwrap().body, "Unknown Location");

    rig.stop().await;
}

/// Fixes go straight to the attached consumer and never to an indicator.
#[tokio::test]
async fn test_fix_reaches_attached_consumer() {
    let rig = Rig::idle();
    let mut session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();

    let fix = LocationFix::new(37.4, -122.1);
    assert_eq!(rig.provider.emit(fix), 1);

    let received = tokio::time::timeout(Duration::from_secs(2), session.next_fix())
        .await
        .unwrap();
    assert_eq!(received, Some(fix));
    assert_eq!(rig.board.posts(), 0);

    let snapshot = rig.quiesce().await;
    assert_eq!(snapshot.latest_fix, Some(fix));
    assert!(!snapshot.indicator_visible);

    drop(session);
    rig.stop().await;
}

/// Unsubscribing in the background tears everything down.
#[tokio::test]
async fn test_unsubscribe_in_background() {
    let rig = Rig::idle();
    let session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();
    session.detach(false);

    let outcome = rig.handle.unsubscribe().unwrap().settled().await;
    assert_eq!(outcome, CancelOutcome::Removed);

    let snapshot = rig.quiesce().await;
    assert!(!snapshot.tracking);
    assert!(!rig.prefs.get());
    assert_eq!(rig.board.live_count(), 0);
    assert_eq!(rig.provider.active_requests(), 0);
    assert!(rig.handle.wait_for_presence(Presence::Stopped).await);

    rig.stop().await;
}

/// A refused subscribe leaves the preference false and nothing subscribed.
#[tokio::test]
async fn test_subscribe_refused() {
    let rig = Rig::idle();
    rig.provider.revoke_permission();

    let result = rig.handle.subscribe().await;
    assert!(matches!(result, Err(TrackingError::PermissionLost(_))));

    let snapshot = rig.quiesce().await;
    assert!(!snapshot.tracking);
    assert!(!rig.prefs.get());
    assert_eq!(rig.provider.active_requests(), 0);

    rig.stop().await;
}

/// A cancellation that fails later puts the preference back to true.
#[tokio::test]
async fn test_cancel_failure_restores_preference() {
    let rig = Rig::spawn(
        Arc::new(MemoryPreferenceStore::new()),
        SimulatedProviderConfig::manual().with_removal_delay(Duration::from_millis(30)),
    );
    let _session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();
    rig.provider.revoke_permission();

    let ticket = rig.handle.unsubscribe().unwrap();
    let pending = rig.handle.snapshot().await.unwrap();
    assert!(pending.cancel_pending);
    assert!(!rig.prefs.get());

    assert_eq!(ticket.settled().await, CancelOutcome::PermissionLost);
    let snapshot = rig.quiesce().await;
    assert!(snapshot.tracking);
    assert!(rig.prefs.get());
    assert_eq!(rig.provider.active_requests(), 1);

    rig.stop().await;
}

/// A removal refused synchronously is settled on the spot.
#[tokio::test]
async fn test_cancel_refused_synchronously() {
    let rig = Rig::idle();
    let _session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();
    rig.provider.revoke_permission();
    rig.provider.set_sync_removal_failure(true);

    let outcome = rig.handle.unsubscribe().unwrap().settled().await;
    assert_eq!(outcome, CancelOutcome::PermissionLost);
    assert!(!outcome.is_stopped());
    assert!(rig.prefs.get());

    rig.stop().await;
}

// ============================================================================
// Properties
// ============================================================================

/// Subscribing twice produces one request and one preference write.
#[tokio::test]
async fn test_double_subscribe_is_idempotent() {
    let rig = Rig::idle();

    rig.handle.subscribe().await.unwrap();
    rig.handle.subscribe().await.unwrap();

    assert_eq!(rig.provider.active_requests(), 1);
    assert_eq!(rig.prefs.writes(), 1);
    assert!(rig.prefs.get());

    rig.stop().await;
}

/// Unsubscribing with nothing active is a no-op.
#[tokio::test]
async fn test_unsubscribe_when_idle() {
    let rig = Rig::idle();

    let outcome = rig.handle.unsubscribe().unwrap().settled().await;
    assert_eq!(outcome, CancelOutcome::NothingActive);
    assert!(!rig.prefs.get());
    assert_eq!(rig.handle.presence(), Presence::Resident);

    rig.stop().await;
}

/// A reconfiguration detach followed by a re-attach is invisible.
#[tokio::test]
async fn test_reconfiguration_is_transparent() {
    let rig = Rig::idle();
    let session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();
    let writes = rig.prefs.writes();

    session.detach_for_reconfiguration();
    let during = rig.handle.snapshot().await.unwrap();
    assert_eq!(during.attachment, AttachmentState::Attached);
    assert!(during.reconfiguring);

    let session = rig.handle.attach().await.unwrap();
    let after = rig.quiesce().await;
    assert!(!after.reconfiguring);
    assert_eq!(rig.board.posts(), 0);
    assert_eq!(rig.prefs.writes(), writes);

    drop(session);
    rig.stop().await;
}

/// A consumer that never comes back after reconfiguration is treated as gone.
#[tokio::test]
async fn test_reattach_grace_expiry() {
    let config = CoordinatorConfig {
        reattach_grace: Some(Duration::from_millis(20)),
        ..CoordinatorConfig::default()
    };
    let rig = Rig::spawn_with(
        Arc::new(MemoryPreferenceStore::new()),
        SimulatedProviderConfig::manual(),
        config,
    );
    let session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();
    session.detach_for_reconfiguration();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let snapshot = rig.quiesce().await;
    assert_eq!(snapshot.attachment, AttachmentState::DetachedRunningBackground);
    assert!(!snapshot.reconfiguring);
    assert_eq!(rig.board.live_count(), 1);

    rig.stop().await;
}

/// Background fixes refresh the posted indicator in place.
#[tokio::test]
async fn test_background_fix_updates_indicator() {
    let rig = Rig::idle();
    let session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();
    session.detach(false);

    rig.provider.emit(LocationFix::new(37.4, -122.1));
    rig.quiesce().await;

    assert_eq!(rig.board.posts(), 1);
    assert_eq!(rig.board.current().unwrap().body, "(37.4, -122.1)");

    rig.stop().await;
}

/// Re-attaching dismisses the indicator and primes the consumer with the
/// last known fix.
#[tokio::test]
async fn test_reattach_from_background() {
    let rig = Rig::idle();
    let session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();
    session.detach(false);

    let fix = LocationFix::new(51.5, -0.1);
    rig.provider.emit(fix);
    rig.quiesce().await;

    let session = rig.handle.attach().await.unwrap();
    assert_eq!(session.latest(), Some(fix));
    assert_eq!(rig.board.live_count(), 0);

    drop(session);
    rig.stop().await;
}

// ============================================================================
// Indicator actions and process entry points
// ============================================================================

/// The indicator's cancel action stops tracking and the background presence.
#[tokio::test]
async fn test_indicator_cancel() {
    let rig = Rig::idle();
    let session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();
    session.detach(false);
    rig.quiesce().await;

    assert!(rig.board.trigger_cancel());
    assert!(rig.handle.wait_for_presence(Presence::Stopped).await);

    let snapshot = rig.quiesce().await;
    assert!(!snapshot.tracking);
    assert!(!rig.prefs.get());
    assert_eq!(rig.board.live_count(), 0);
    assert_eq!(rig.provider.active_requests(), 0);

    rig.stop().await;
}

/// If the provider will not stop, an indicator cancel still ends the
/// background presence with the preference reflecting the live request.
#[tokio::test]
async fn test_indicator_cancel_failure() {
    let rig = Rig::idle();
    let session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();
    session.detach(false);
    rig.quiesce().await;
    rig.provider.revoke_permission();

    assert!(rig.board.trigger_cancel());
    assert!(rig.handle.wait_for_presence(Presence::Stopped).await);

    rig.quiesce().await;
    assert!(rig.prefs.get());
    assert_eq!(rig.provider.active_requests(), 1);
    assert_eq!(rig.board.live_count(), 0);

    rig.stop().await;
}

/// The launch action brings the coordinator back to resident.
#[tokio::test]
async fn test_indicator_launch() {
    let rig = Rig::idle();
    let session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();
    session.detach(false);
    rig.quiesce().await;

    assert!(rig.board.trigger_launch());
    assert_eq!(rig.handle.presence(), Presence::Resident);
    assert!(rig.quiesce().await.tracking);

    rig.stop().await;
}

/// A cancel command delivered at startup clears a restored subscription.
#[tokio::test]
async fn test_cancel_command_at_startup() {
    let rig = Rig::spawn(
        Arc::new(MemoryPreferenceStore::with_value(true)),
        SimulatedProviderConfig::manual(),
    );
    rig.handle
        .start_command(StartCommand::CancelTracking)
        .unwrap();

    assert!(rig.handle.wait_for_presence(Presence::Stopped).await);
    assert!(!rig.prefs.get());
    assert_eq!(rig.provider.active_requests(), 0);

    rig.stop().await;
}

/// Tracking left on by a previous run resumes in the background.
#[tokio::test]
async fn test_restore_on_startup() {
    let rig = Rig::spawn(
        Arc::new(MemoryPreferenceStore::with_value(true)),
        SimulatedProviderConfig::manual(),
    );

    let snapshot = rig.quiesce().await;
    assert_eq!(snapshot.attachment, AttachmentState::DetachedRunningBackground);
    assert!(snapshot.tracking);
    assert_eq!(rig.provider.active_requests(), 1);
    assert_eq!(rig.board.current().unwrap().body, "Unknown Location");

    rig.stop().await;
}

// ============================================================================
// Ordering
// ============================================================================

/// A subscribe issued while a cancellation is in flight waits for it.
#[tokio::test]
async fn test_subscribe_during_pending_cancel() {
    let rig = Rig::spawn(
        Arc::new(MemoryPreferenceStore::new()),
        SimulatedProviderConfig::manual().with_removal_delay(Duration::from_millis(30)),
    );
    let _session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();

    let ticket = rig.handle.unsubscribe().unwrap();
    rig.handle.subscribe().await.unwrap();
    assert_eq!(ticket.settled().await, CancelOutcome::Removed);

    let snapshot = rig.quiesce().await;
    assert!(snapshot.tracking);
    assert!(rig.prefs.get());
    assert_eq!(rig.provider.active_requests(), 1);

    rig.stop().await;
}

/// An unsubscribe overtakes a subscribe still waiting on a cancellation.
#[tokio::test]
async fn test_deferred_subscribe_superseded() {
    let rig = Rig::spawn(
        Arc::new(MemoryPreferenceStore::new()),
        SimulatedProviderConfig::manual().with_removal_delay(Duration::from_millis(300)),
    );
    let _session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();

    let first = rig.handle.unsubscribe().unwrap();
    let handle = rig.handle.clone();
    let deferred = tokio::spawn(async move { handle.subscribe().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = rig.handle.unsubscribe().unwrap();

    assert_eq!(first.settled().await, CancelOutcome::Removed);
    assert_eq!(second.settled().await, CancelOutcome::Removed);
    assert_eq!(deferred.await.unwrap(), Err(TrackingError::Superseded));

    let snapshot = rig.quiesce().await;
    assert!(!snapshot.tracking);
    assert!(!rig.prefs.get());
    assert_eq!(rig.provider.active_requests(), 0);

    rig.stop().await;
}

/// Losing the permission under a running stream disables tracking.
#[tokio::test]
async fn test_stream_permission_lost() {
    let rig = Rig::idle();
    let session = rig.handle.attach().await.unwrap();
    rig.handle.subscribe().await.unwrap();
    session.detach(false);
    rig.quiesce().await;

    rig.provider.report_permission_lost();
    assert!(rig.handle.wait_for_presence(Presence::Stopped).await);

    let snapshot = rig.quiesce().await;
    assert!(!snapshot.tracking);
    assert!(!rig.prefs.get());
    assert_eq!(snapshot.attachment, AttachmentState::DetachedIdle);
    assert_eq!(rig.board.live_count(), 0);

    rig.stop().await;
}

/// Shutting the coordinator down settles outstanding tickets and stops
/// further commands.
#[tokio::test]
async fn test_shutdown_abandons_pending_cancel() {
    let rig = Rig::spawn(
        Arc::new(MemoryPreferenceStore::new()),
        SimulatedProviderConfig::manual().with_removal_delay(Duration::from_secs(5)),
    );
    rig.handle.subscribe().await.unwrap();
    let ticket = rig.handle.unsubscribe().unwrap();
    rig.handle.snapshot().await.unwrap();

    let handle = rig.handle.clone();
    rig.stop().await;

    assert_eq!(ticket.settled().await, CancelOutcome::Abandoned);
    assert_eq!(handle.presence(), Presence::Stopped);
    assert!(matches!(
        handle.subscribe().await,
        Err(TrackingError::CoordinatorStopped)
    ));
}

// ============================================================================
// Latest fix and preference write failures
// ============================================================================

/// Fixes that arrive while idle are not shown but still become the latest
/// fix, for a later consumer or indicator.
#[tokio::test]
async fn test_idle_fixes_seed_latest_fix() {
    let rig = Rig::idle();
    rig.handle.subscribe().await.unwrap();

    let fix = LocationFix::new(37.4, -122.1);
    rig.provider.emit(fix);
    let snapshot = rig.quiesce().await;
    assert_eq!(snapshot.attachment, AttachmentState::DetachedIdle);
    assert_eq!(snapshot.latest_fix, Some(fix));
    assert_eq!(snapshot.fixes_received, 1);
    assert_eq!(rig.board.posts(), 0);

    let session = rig.handle.attach().await.unwrap();
    assert_eq!(session.latest(), Some(fix));
    session.detach(false);

    rig.quiesce().await;
    assert_eq!(rig.board.current().unwrap().body, "(37.4, -122.1)");

    rig.stop().await;
}

/// A store that refuses writes does not make the coordinator forget that
/// tracking is on.
#[tokio::test]
async fn test_refused_preference_write_keeps_tracking_visible() {
    let store = Arc::new(ReadOnlyPreferenceStore::new(false));
    let (handle, provider, board, shutdown) = spawn_over(store.clone());

    let session = handle.attach().await.unwrap();
    handle.subscribe().await.unwrap();
    assert_eq!(store.attempts(), 1);
    session.detach(false);

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.tracking);
    assert!(snapshot.tracking_preference);
    assert_eq!(snapshot.attachment, AttachmentState::DetachedRunningBackground);
    assert_eq!(board.live_count(), 1);
    assert_eq!(provider.active_requests(), 1);

    shutdown.cancel();
}

/// A file store whose directory cannot be created still reads back what was
/// last set.
#[tokio::test]
async fn test_unwritable_file_store_keeps_tracking_visible() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let store = Arc::new(FilePreferenceStore::open(blocker.join("prefs.ini")).unwrap());
    let (handle, provider, board, shutdown) = spawn_over(store.clone());

    let session = handle.attach().await.unwrap();
    handle.subscribe().await.unwrap();
    session.detach(false);

    let snapshot = handle.snapshot().await.unwrap();
    assert!(store.get());
    assert!(snapshot.tracking);
    assert_eq!(snapshot.attachment, AttachmentState::DetachedRunningBackground);
    assert_eq!(board.live_count(), 1);
    assert_eq!(provider.active_requests(), 1);

    shutdown.cancel();
}
