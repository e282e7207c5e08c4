//! Persistent user-visible indicator.
//!
//! While tracking runs without an attached consumer, the coordinator keeps an
//! indicator posted so the user can see the latest position and stop
//! tracking. The indicator carries two actions: one re-launches the consumer,
//! the other cancels tracking. Both are delivered to the coordinator as
//! [`StartCommand`]s, the same way a process entry point would.

mod board;

pub use board::{IndicatorBoard, PostedIndicator};

use std::fmt;

use tokio::sync::mpsc;

use crate::coordinator::{Command, StartCommand};

/// Handle to a posted indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndicatorHandle(u64);

impl IndicatorHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// An action the user can take on the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorAction {
    /// Bring the consumer back to the foreground.
    Launch,
    /// Stop tracking and remove the indicator.
    Cancel,
}

impl IndicatorAction {
    /// Label shown next to the action.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Launch => "Launch activity",
            Self::Cancel => "Stop location updates",
        }
    }

    fn start_command(&self) -> StartCommand {
        match self {
            Self::Launch => StartCommand::Start,
            Self::Cancel => StartCommand::CancelTracking,
        }
    }
}

/// Routes indicator actions back to the coordinator that posted it.
#[derive(Clone)]
pub struct IndicatorActions {
    commands: mpsc::UnboundedSender<Command>,
}

impl IndicatorActions {
    pub(crate) fn new(commands: mpsc::UnboundedSender<Command>) -> Self {
        Self { commands }
    }

    /// Trigger `action`. Returns false if the coordinator has stopped.
    pub fn trigger(&self, action: IndicatorAction) -> bool {
        self.commands
            .send(Command::Start(action.start_command()))
            .is_ok()
    }

    /// Trigger the launch action.
    pub fn launch(&self) -> bool {
        self.trigger(IndicatorAction::Launch)
    }

    /// Trigger the cancel action.
    pub fn cancel(&self) -> bool {
        self.trigger(IndicatorAction::Cancel)
    }
}

impl fmt::Debug for IndicatorActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorActions")
            .field("closed", &self.commands.is_closed())
            .finish()
    }
}

/// What to show on a newly posted indicator.
#[derive(Debug, Clone)]
pub struct IndicatorContent {
    /// Indicator title.
    pub title: String,
    /// Body text, the latest fix or "Unknown Location".
    pub body: String,
    /// Launch and cancel actions.
    pub actions: IndicatorActions,
}

/// Surface on which the indicator is shown.
///
/// Updating or dismissing a handle that is no longer posted must be a no-op.
pub trait IndicatorChannel: Send + Sync + 'static {
    /// Show a new indicator.
    fn post(&self, content: IndicatorContent) -> IndicatorHandle;

    /// Replace the body text of a posted indicator.
    fn update(&self, handle: IndicatorHandle, body: &str);

    /// Remove a posted indicator.
    fn dismiss(&self, handle: IndicatorHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_map_to_start_commands() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let actions = IndicatorActions::new(tx);

        assert!(actions.cancel());
        assert!(actions.launch());

        assert!(matches!(
            rx.try_recv().unwrap(),
            Command::Start(StartCommand::CancelTracking)
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            Command::Start(StartCommand::Start)
        ));
    }

    #[test]
    fn test_actions_after_shutdown() {
        let (tx, rx) = mpsc::unbounded_channel();
        let actions = IndicatorActions::new(tx);
        drop(rx);
        assert!(!actions.cancel());
    }
}
