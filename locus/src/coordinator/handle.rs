//! Cloneable handle for talking to a running coordinator.

use tokio::sync::{mpsc, oneshot, watch};

use super::command::{CancelOrigin, Command, StartCommand};
use super::consumer::ConsumerSession;
use super::error::{CancelOutcome, TrackingError};
use super::state::{CoordinatorSnapshot, Presence};

/// Sends commands to a [`TrackingCoordinator`](super::TrackingCoordinator).
///
/// Every method enqueues a command and returns; none of them touch
/// coordinator state directly.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
    presence: watch::Receiver<Presence>,
}

impl CoordinatorHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        presence: watch::Receiver<Presence>,
    ) -> Self {
        Self { commands, presence }
    }

    /// Start tracking.
    ///
    /// Resolves once the provider has accepted or refused the request. A
    /// call while tracking is already active succeeds without side effects.
    pub async fn subscribe(&self) -> Result<(), TrackingError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Subscribe { reply })?;
        rx.await.map_err(|_| TrackingError::CoordinatorStopped)?
    }

    /// Stop tracking.
    ///
    /// The preference is cleared as soon as the command is processed; the
    /// returned ticket resolves once the provider has settled the removal.
    pub fn unsubscribe(&self) -> Result<CancelTicket, TrackingError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Unsubscribe {
            origin: CancelOrigin::Consumer,
            reply: Some(reply),
        })?;
        Ok(CancelTicket { rx })
    }

    /// Attach a consumer and start receiving fixes directly.
    pub async fn attach(&self) -> Result<ConsumerSession, TrackingError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Attach { reply })?;
        let fixes = rx.await.map_err(|_| TrackingError::CoordinatorStopped)?;
        Ok(ConsumerSession::new(self.clone(), fixes))
    }

    /// Deliver a process-level start command.
    pub fn start_command(&self, command: StartCommand) -> Result<(), TrackingError> {
        self.send(Command::Start(command))
    }

    /// Current coordinator state.
    pub async fn snapshot(&self) -> Result<CoordinatorSnapshot, TrackingError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply })?;
        rx.await.map_err(|_| TrackingError::CoordinatorStopped)
    }

    /// Current background presence.
    pub fn presence(&self) -> Presence {
        *self.presence.borrow()
    }

    /// Wait until the presence reaches `target`.
    ///
    /// Returns false if the coordinator stops first.
    pub async fn wait_for_presence(&self, target: Presence) -> bool {
        let mut presence = self.presence.clone();
        let reached = presence.wait_for(|p| *p == target).await.is_ok();
        reached
    }

    /// Whether the coordinator task is still consuming commands.
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    pub(crate) fn detach(&self, reconfiguration: bool) {
        let _ = self.commands.send(Command::Detach { reconfiguration });
    }

    fn send(&self, command: Command) -> Result<(), TrackingError> {
        self.commands
            .send(command)
            .map_err(|_| TrackingError::CoordinatorStopped)
    }
}

/// Completion of an [`unsubscribe`](CoordinatorHandle::unsubscribe).
#[must_use = "the ticket reports whether the provider removed the subscription"]
pub struct CancelTicket {
    rx: oneshot::Receiver<CancelOutcome>,
}

impl CancelTicket {
    /// Wait for the provider to settle the cancellation.
    pub async fn settled(self) -> CancelOutcome {
        self.rx.await.unwrap_or(CancelOutcome::Abandoned)
    }
}
