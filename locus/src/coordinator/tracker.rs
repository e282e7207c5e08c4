//! The tracking coordinator task.
//!
//! [`TrackingCoordinator`] owns every piece of tracking state and mutates it
//! from exactly one place: its run loop, which pulls [`Command`]s off an
//! unbounded queue and handles each to completion before taking the next.
//! Provider completions are awaited on a side task and come back as
//! `CancelSettled` commands, so nothing in a handler ever blocks.
//!
//! # State
//!
//! ```text
//!                 attach                      detach(false), pref=true
//!  DetachedIdle ─────────► Attached ───────────────────────────► DetachedRunningBackground
//!       ▲                   │  ▲ │                                        │
//!       │ detach(false),    │  │ └─ detach(true): stays Attached          │
//!       │ pref=false        │  │    (grace timer armed)                   │
//!       └───────────────────┘  └──────────────── attach ──────────────────┘
//! ```
//!
//! The tracking preference is written before every provider request and
//! reconciled with the provider's answer, so at every quiescent point it
//! equals "a subscription exists". An indicator is posted exactly while the
//! state is `DetachedRunningBackground`.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::command::{CancelOrigin, Command, ProviderEvent, StartCommand};
use super::consumer::ConsumerLink;
use super::error::{CancelOutcome, TrackingError};
use super::handle::CoordinatorHandle;
use super::state::{
    AttachmentState, CoordinatorConfig, CoordinatorSnapshot, Presence, SubscriptionId,
    TrackingSubscription,
};
use crate::fix::{self, LocationFix};
use crate::indicator::{IndicatorActions, IndicatorChannel, IndicatorContent, IndicatorHandle};
use crate::preferences::PreferenceStore;
use crate::provider::{FixSink, LocationProvider, ProviderError};

// =============================================================================
// Pending cancellation
// =============================================================================

/// A removal the provider has not settled yet.
struct PendingCancel {
    subscription: TrackingSubscription,
    origin: CancelOrigin,
    waiters: Vec<oneshot::Sender<CancelOutcome>>,
}

impl PendingCancel {
    fn settle(self, outcome: CancelOutcome) {
        for waiter in self.waiters {
            let _ = waiter.send(outcome);
        }
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// Lifecycle coordinator for foreground location tracking.
///
/// Create with [`TrackingCoordinator::new`], then drive with
/// [`run`](Self::run) on a tokio task. All interaction goes through the
/// returned [`CoordinatorHandle`].
///
/// # Example
///
/// ```ignore
/// let (coordinator, handle) = TrackingCoordinator::new(config, provider, indicator, prefs);
/// let shutdown = CancellationToken::new();
/// tokio::spawn(coordinator.run(shutdown.clone()));
///
/// let session = handle.attach().await?;
/// handle.subscribe().await?;
/// ```
pub struct TrackingCoordinator {
    config: CoordinatorConfig,
    provider: Arc<dyn LocationProvider>,
    indicator: Arc<dyn IndicatorChannel>,
    preferences: Arc<dyn PreferenceStore>,

    commands_tx: mpsc::UnboundedSender<Command>,
    commands_rx: mpsc::UnboundedReceiver<Command>,
    presence_tx: watch::Sender<Presence>,
    consumer: ConsumerLink,

    attachment: AttachmentState,
    subscription: Option<TrackingSubscription>,
    pending_cancel: Option<PendingCancel>,
    deferred_subscribes: Vec<oneshot::Sender<Result<(), TrackingError>>>,
    reconfiguring: bool,
    grace_epoch: u64,
    latest_fix: Option<LocationFix>,
    indicator_handle: Option<IndicatorHandle>,
    /// Last value handed to the preference store, kept even if the write
    /// failed.
    tracking_enabled: bool,

    next_subscription_id: u64,
    fixes_received: u64,
}

impl TrackingCoordinator {
    /// Create a coordinator and the handle used to drive it.
    ///
    /// If the stored preference says tracking was enabled, the coordinator
    /// starts in the background state and re-issues the provider request as
    /// soon as [`run`](Self::run) begins.
    pub fn new(
        config: CoordinatorConfig,
        provider: Arc<dyn LocationProvider>,
        indicator: Arc<dyn IndicatorChannel>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> (Self, CoordinatorHandle) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (presence_tx, presence_rx) = watch::channel(Presence::Resident);
        let handle = CoordinatorHandle::new(commands_tx.clone(), presence_rx);

        let tracking_enabled = preferences.get();
        let attachment = if tracking_enabled {
            AttachmentState::DetachedRunningBackground
        } else {
            AttachmentState::DetachedIdle
        };

        let coordinator = Self {
            config,
            provider,
            indicator,
            preferences,
            commands_tx,
            commands_rx,
            presence_tx,
            consumer: ConsumerLink::new(),
            attachment,
            subscription: None,
            pending_cancel: None,
            deferred_subscribes: Vec::new(),
            reconfiguring: false,
            grace_epoch: 0,
            latest_fix: None,
            indicator_handle: None,
            tracking_enabled,
            next_subscription_id: 1,
            fixes_received: 0,
        };

        (coordinator, handle)
    }

    /// Process commands until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(state = %self.attachment, "Tracking coordinator started");
        self.restore();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Tracking coordinator shutting down");
                    break;
                }

                Some(command) = self.commands_rx.recv() => {
                    self.handle(command);
                }
            }
        }

        self.shutdown();
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Subscribe { reply } => self.on_subscribe(reply),
            Command::Unsubscribe { origin, reply } => self.unsubscribe(origin, reply),
            Command::Attach { reply } => self.on_attach(reply),
            Command::Detach { reconfiguration } => self.on_detach(reconfiguration),
            Command::Start(start) => self.on_start(start),
            Command::Provider {
                subscription,
                event,
            } => match event {
                ProviderEvent::Fix(fix) => self.on_fix(subscription, fix),
                ProviderEvent::PermissionLost(e) => {
                    self.on_stream_permission_lost(subscription, e)
                }
            },
            Command::CancelSettled {
                subscription,
                result,
            } => self.on_cancel_settled(subscription, result),
            Command::ReattachGraceExpired { epoch } => self.on_grace_expired(epoch),
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    // =========================================================================
    // Startup and shutdown
    // =========================================================================

    /// Resume tracking left enabled by a previous run.
    fn restore(&mut self) {
        if self.attachment != AttachmentState::DetachedRunningBackground {
            return;
        }

        info!("Tracking was enabled before restart, resuming in background");
        self.show_indicator();
        if let Err(e) = self.subscribe() {
            warn!(error = %e, "Could not resume tracking");
            self.wind_down_background();
        }
    }

    fn shutdown(&mut self) {
        self.dismiss_indicator();
        self.set_presence(Presence::Stopped);
        if let Some(pending) = self.pending_cancel.take() {
            pending.settle(CancelOutcome::Abandoned);
        }
        info!(
            tracking = self.subscription.is_some(),
            fixes = self.fixes_received,
            "Tracking coordinator stopped"
        );
    }

    // =========================================================================
    // Subscription lifecycle
    // =========================================================================

    fn on_subscribe(&mut self, reply: oneshot::Sender<Result<(), TrackingError>>) {
        if self.pending_cancel.is_some() {
            debug!("Cancellation in flight, deferring subscribe");
            self.deferred_subscribes.push(reply);
            return;
        }
        let _ = reply.send(self.subscribe());
    }

    fn subscribe(&mut self) -> Result<(), TrackingError> {
        if self.subscription.is_some() {
            debug!("Already tracking, subscribe ignored");
            return Ok(());
        }

        // Intent is recorded first so a restart mid-request still resumes.
        self.persist(true);

        let id = SubscriptionId::new(self.next_subscription_id);
        self.next_subscription_id += 1;
        let sink = FixSink::new(id, self.commands_tx.clone());

        match self.provider.request_updates(&self.config.request, sink) {
            Ok(handle) => {
                self.subscription = Some(TrackingSubscription {
                    id,
                    request: self.config.request,
                    handle,
                });
                self.set_presence(Presence::Resident);
                info!(
                    subscription = %id,
                    handle = %handle,
                    interval_ms = self.config.request.interval.as_millis() as u64,
                    "Location updates requested"
                );
                Ok(())
            }
            Err(e) => {
                self.persist(false);
                error!(error = %e, "Location updates refused, tracking disabled");
                Err(TrackingError::PermissionLost(e))
            }
        }
    }

    fn unsubscribe(
        &mut self,
        origin: CancelOrigin,
        reply: Option<oneshot::Sender<CancelOutcome>>,
    ) {
        for deferred in self.deferred_subscribes.drain(..) {
            let _ = deferred.send(Err(TrackingError::Superseded));
        }

        self.persist(false);

        if let Some(pending) = self.pending_cancel.as_mut() {
            debug!("Cancellation already in flight, joining it");
            pending.waiters.extend(reply);
            if origin == CancelOrigin::Indicator {
                pending.origin = CancelOrigin::Indicator;
            }
            return;
        }

        let Some(subscription) = self.subscription.take() else {
            debug!("Not tracking, unsubscribe ignored");
            if let Some(reply) = reply {
                let _ = reply.send(CancelOutcome::NothingActive);
            }
            if origin == CancelOrigin::Indicator {
                self.terminate_presence();
            }
            return;
        };

        info!(subscription = %subscription.id, origin = ?origin, "Removing location updates");

        let pending = PendingCancel {
            subscription,
            origin,
            waiters: reply.into_iter().collect(),
        };

        match self.provider.remove_updates(subscription.handle) {
            Ok(removal) => {
                self.pending_cancel = Some(pending);
                let commands = self.commands_tx.clone();
                let id = subscription.id;
                tokio::spawn(async move {
                    let result = removal.await;
                    let _ = commands.send(Command::CancelSettled {
                        subscription: id,
                        result,
                    });
                });
            }
            Err(e) => self.settle_cancel_failure(pending, e),
        }
    }

    fn on_cancel_settled(&mut self, id: SubscriptionId, result: Result<(), ProviderError>) {
        if self.pending_cancel.as_ref().map(|p| p.subscription.id) != Some(id) {
            debug!(subscription = %id, "Stale cancellation result ignored");
            return;
        }
        let Some(pending) = self.pending_cancel.take() else {
            return;
        };

        match result {
            Ok(()) => {
                info!(subscription = %id, "Location updates removed");
                let origin = pending.origin;
                pending.settle(CancelOutcome::Removed);
                self.replay_deferred_subscribes();

                if origin == CancelOrigin::Indicator && self.subscription.is_none() {
                    self.terminate_presence();
                } else {
                    self.wind_down_background();
                }
            }
            Err(e) => {
                self.settle_cancel_failure(pending, e);
                self.replay_deferred_subscribes();
            }
        }
    }

    /// The provider would not stop: the subscription is still live, so the
    /// preference goes back to `true`.
    fn settle_cancel_failure(&mut self, pending: PendingCancel, e: ProviderError) {
        self.subscription = Some(pending.subscription);
        self.persist(true);
        warn!(
            subscription = %pending.subscription.id,
            error = %e,
            "Could not remove location updates, tracking preference restored"
        );

        let origin = pending.origin;
        pending.settle(CancelOutcome::PermissionLost);

        match origin {
            CancelOrigin::Indicator => self.terminate_presence(),
            CancelOrigin::Consumer if self.attachment == AttachmentState::DetachedIdle => {
                self.promote_or_idle();
            }
            CancelOrigin::Consumer => {}
        }
    }

    fn replay_deferred_subscribes(&mut self) {
        let deferred = std::mem::take(&mut self.deferred_subscribes);
        if !deferred.is_empty() {
            debug!(count = deferred.len(), "Replaying deferred subscribes");
        }
        for reply in deferred {
            let _ = reply.send(self.subscribe());
        }
    }

    // =========================================================================
    // Consumer attachment
    // =========================================================================

    fn on_attach(&mut self, reply: oneshot::Sender<watch::Receiver<Option<LocationFix>>>) {
        self.dismiss_indicator();
        self.attachment = AttachmentState::Attached;
        self.reconfiguring = false;
        self.grace_epoch += 1;
        self.set_presence(Presence::Resident);
        info!(tracking = self.subscription.is_some(), "Consumer attached");

        let _ = reply.send(self.consumer.subscribe(self.latest_fix));
    }

    fn on_detach(&mut self, reconfiguration: bool) {
        if reconfiguration {
            if self.attachment != AttachmentState::Attached {
                debug!(
                    state = %self.attachment,
                    "Reconfiguration detach while not attached ignored"
                );
                return;
            }
            self.reconfiguring = true;
            self.grace_epoch += 1;
            debug!("Consumer detached for reconfiguration, awaiting re-attach");
            self.schedule_grace_timer();
            return;
        }

        self.reconfiguring = false;
        self.grace_epoch += 1;
        info!(state = %self.attachment, "Consumer detached");
        self.promote_or_idle();
    }

    fn schedule_grace_timer(&self) {
        let Some(grace) = self.config.reattach_grace else {
            return;
        };
        let epoch = self.grace_epoch;
        let commands = self.commands_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let _ = commands.send(Command::ReattachGraceExpired { epoch });
        });
    }

    fn on_grace_expired(&mut self, epoch: u64) {
        if epoch != self.grace_epoch || !self.reconfiguring {
            return;
        }
        warn!("Consumer did not re-attach after reconfiguration, treating as detached");
        self.reconfiguring = false;
        self.promote_or_idle();
    }

    /// Leave the attached state according to the tracking preference.
    fn promote_or_idle(&mut self) {
        if self.tracking_enabled {
            self.attachment = AttachmentState::DetachedRunningBackground;
            self.show_indicator();
            self.set_presence(Presence::Resident);
            info!("Tracking continues in background");
        } else {
            self.attachment = AttachmentState::DetachedIdle;
            self.dismiss_indicator();
        }
    }

    // =========================================================================
    // Provider events
    // =========================================================================

    fn on_fix(&mut self, id: SubscriptionId, fix: LocationFix) {
        if self.subscription.map(|s| s.id) != Some(id) {
            debug!(subscription = %id, "Fix from inactive subscription dropped");
            return;
        }

        match self.attachment {
            AttachmentState::Attached => {
                self.record_fix(fix);
                self.consumer.push(fix);
            }
            AttachmentState::DetachedRunningBackground => {
                self.record_fix(fix);
                self.show_indicator();
            }
            AttachmentState::DetachedIdle => {
                self.record_fix(fix);
            }
        }
    }

    fn record_fix(&mut self, fix: LocationFix) {
        self.latest_fix = Some(fix);
        self.fixes_received += 1;
        debug!(%fix, state = %self.attachment, "Fix received");
    }

    fn on_stream_permission_lost(&mut self, id: SubscriptionId, e: ProviderError) {
        if self.subscription.map(|s| s.id) != Some(id) {
            debug!(subscription = %id, "Stream failure from inactive subscription ignored");
            return;
        }

        self.subscription = None;
        self.persist(false);
        error!(subscription = %id, error = %e, "Location stream stopped, tracking disabled");
        self.wind_down_background();
    }

    // =========================================================================
    // Process entry points
    // =========================================================================

    fn on_start(&mut self, command: StartCommand) {
        match command {
            StartCommand::Start => {
                debug!("Start command on running coordinator");
                self.set_presence(Presence::Resident);
            }
            StartCommand::CancelTracking => {
                info!("Cancel requested from indicator");
                self.unsubscribe(CancelOrigin::Indicator, None);
            }
        }
    }

    /// Stop the presence once nothing is left to track and no consumer is
    /// attached.
    fn wind_down_background(&mut self) {
        if self.attachment == AttachmentState::Attached
            || self.subscription.is_some()
            || self.pending_cancel.is_some()
        {
            return;
        }
        self.dismiss_indicator();
        self.attachment = AttachmentState::DetachedIdle;
        self.set_presence(Presence::Stopped);
        info!("Nothing left to track, background presence stopped");
    }

    fn terminate_presence(&mut self) {
        if self.attachment == AttachmentState::Attached {
            debug!("Consumer attached, staying resident");
            return;
        }
        self.dismiss_indicator();
        self.attachment = AttachmentState::DetachedIdle;
        self.set_presence(Presence::Stopped);
        info!("Background presence terminated");
    }

    // =========================================================================
    // Collaborators
    // =========================================================================

    fn persist(&mut self, enabled: bool) {
        self.tracking_enabled = enabled;
        if let Err(e) = self.preferences.set(enabled) {
            warn!(enabled, error = %e, "Failed to store tracking preference");
        }
    }

    fn set_presence(&self, presence: Presence) {
        self.presence_tx.send_if_modified(|current| {
            if *current == presence {
                false
            } else {
                *current = presence;
                true
            }
        });
    }

    /// Post the indicator, or refresh it if already posted.
    fn show_indicator(&mut self) {
        let body = fix::describe(self.latest_fix.as_ref());
        match self.indicator_handle {
            Some(handle) => self.indicator.update(handle, &body),
            None => {
                let content = IndicatorContent {
                    title: self.config.indicator_title.clone(),
                    body,
                    actions: IndicatorActions::new(self.commands_tx.clone()),
                };
                self.indicator_handle = Some(self.indicator.post(content));
            }
        }
    }

    fn dismiss_indicator(&mut self) {
        if let Some(handle) = self.indicator_handle.take() {
            self.indicator.dismiss(handle);
        }
    }

    fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            attachment: self.attachment,
            tracking: self.subscription.is_some(),
            cancel_pending: self.pending_cancel.is_some(),
            reconfiguring: self.reconfiguring,
            latest_fix: self.latest_fix,
            indicator_visible: self.indicator_handle.is_some(),
            tracking_preference: self.tracking_enabled,
            presence: *self.presence_tx.borrow(),
            fixes_received: self.fixes_received,
        }
    }
}
