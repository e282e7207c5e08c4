//! Interactive terminal consumer.
//!
//! Plays the part of the foreground screen: it attaches to the coordinator,
//! prints directly delivered fixes and turns typed commands into consumer,
//! indicator and provider events.

use std::io::Write;

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use locus::coordinator::{
    CancelOutcome, CoordinatorHandle, ConsumerSession, Presence, TrackingError,
};
use locus::fix::{self, LocationFix};
use locus::provider::SimulatedProvider;

use super::TerminalIndicator;
use crate::error::CliError;

const HELP: &[(&str, &str)] = &[
    ("toggle", "Start or stop tracking, as the main button does"),
    ("start", "Subscribe to location updates"),
    ("stop", "Unsubscribe from location updates"),
    ("attach", "Bring the consumer to the foreground"),
    ("detach", "Leave the foreground"),
    ("rotate", "Detach for reconfiguration and re-attach"),
    ("tap-cancel", "Press the indicator's stop action"),
    ("tap-launch", "Press the indicator's launch action"),
    ("grant", "Grant the location permission"),
    ("revoke", "Revoke the location permission"),
    ("lose-permission", "Revoke the permission under a running stream"),
    ("fix", "Emit the next simulated fix"),
    ("status", "Show coordinator state"),
    ("quit", "Exit"),
];

enum Flow {
    Continue,
    Quit,
}

/// Line-driven stand-in for the foreground consumer.
pub struct Console {
    handle: CoordinatorHandle,
    provider: SimulatedProvider,
    indicator: TerminalIndicator,
    quit: CancellationToken,
    session: Option<ConsumerSession>,
    /// Set once the user pressed the indicator's stop action.
    cancel_requested: bool,
}

impl Console {
    pub fn new(
        handle: CoordinatorHandle,
        provider: SimulatedProvider,
        indicator: TerminalIndicator,
        quit: CancellationToken,
    ) -> Self {
        Self {
            handle,
            provider,
            indicator,
            quit,
            session: None,
            cancel_requested: false,
        }
    }

    /// Run until `quit`, end of input, or the background presence stops
    /// while no consumer is attached and tracking was running in the
    /// background or cancelled from the indicator.
    pub async fn run(&mut self, attach_at_start: bool) -> Result<(), CliError> {
        println!(
            "{} {}",
            style("locus").bold().cyan(),
            style("type `help` for commands").dim()
        );
        if attach_at_start {
            self.attach().await?;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        prompt();

        loop {
            let watch_presence = self.session.is_none()
                && (self.cancel_requested || self.indicator.board().live_count() > 0);
            let presence_handle = self.handle.clone();

            tokio::select! {
                biased;

                _ = self.quit.cancelled() => break,

                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if let Flow::Quit = self.execute(line.trim()).await? {
                        break;
                    }
                    prompt();
                }

                Some(fix) = next_fix(&mut self.session) => {
                    println!("Foreground location: {}", fix);
                }

                _ = presence_handle.wait_for_presence(Presence::Stopped), if watch_presence => {
                    println!("{}", style("Background tracking stopped, exiting.").dim());
                    break;
                }
            }
        }

        if let Some(session) = self.session.take() {
            session.detach(false);
        }
        Ok(())
    }

    async fn execute(&mut self, line: &str) -> Result<Flow, CliError> {
        match line {
            "" => {}
            "toggle" => self.toggle().await?,
            "start" => self.subscribe().await?,
            "stop" => self.unsubscribe().await?,
            "attach" => self.attach().await?,
            "detach" => self.detach(),
            "rotate" => self.rotate().await?,
            "tap-cancel" => {
                if self.indicator.board().trigger_cancel() {
                    self.cancel_requested = true;
                } else {
                    println!("No indicator is showing.");
                }
            }
            "tap-launch" => {
                if self.indicator.board().trigger_launch() {
                    self.attach().await?;
                } else {
                    println!("No indicator is showing.");
                }
            }
            "grant" => {
                self.provider.grant_permission();
                println!("Location permission granted.");
            }
            "revoke" => {
                self.provider.revoke_permission();
                println!("Location permission revoked.");
            }
            "lose-permission" => {
                self.provider.report_permission_lost();
                println!("Location permission lost under the running stream.");
            }
            "fix" => {
                let fix = self.provider.emit_next();
                println!("{}", style(format!("emitted {}", fix)).dim());
            }
            "status" => self.print_status().await?,
            "help" | "?" => print_help(),
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            other => println!("Unknown command '{}'. Type `help` for commands.", other),
        }
        Ok(Flow::Continue)
    }

    /// The coordinator to send subscription calls to.
    fn coordinator(&self) -> &CoordinatorHandle {
        self.session
            .as_ref()
            .map(ConsumerSession::coordinator)
            .unwrap_or(&self.handle)
    }

    async fn toggle(&mut self) -> Result<(), CliError> {
        let snapshot = self.coordinator().snapshot().await?;
        if snapshot.tracking_preference {
            self.unsubscribe().await
        } else if self.provider.has_permission() {
            self.subscribe().await
        } else {
            println!("Location permission is needed to track. Use `grant` first.");
            Ok(())
        }
    }

    async fn subscribe(&mut self) -> Result<(), CliError> {
        match self.coordinator().subscribe().await {
            Ok(()) => println!("{}", style("Tracking started.").green()),
            Err(TrackingError::PermissionLost(e)) => {
                println!("{} {}", style("Could not start tracking:").red(), e);
            }
            Err(TrackingError::Superseded) => {
                println!("Start was overtaken by a later stop.");
            }
            Err(e @ TrackingError::CoordinatorStopped) => return Err(e.into()),
        }
        Ok(())
    }

    async fn unsubscribe(&mut self) -> Result<(), CliError> {
        let ticket = self.coordinator().unsubscribe()?;
        match ticket.settled().await {
            CancelOutcome::Removed => println!("{}", style("Tracking stopped.").green()),
            CancelOutcome::NothingActive => println!("Tracking was not active."),
            CancelOutcome::PermissionLost => println!(
                "{} tracking is still active",
                style("Could not stop tracking:").red()
            ),
            CancelOutcome::Abandoned => return Err(TrackingError::CoordinatorStopped.into()),
        }
        Ok(())
    }

    async fn attach(&mut self) -> Result<(), CliError> {
        if self.session.is_some() {
            println!("Already attached.");
            return Ok(());
        }
        let session = self.handle.attach().await?;
        println!(
            "{} last known: {}",
            style("Attached.").green(),
            fix::describe(session.latest().as_ref())
        );
        self.session = Some(session);
        Ok(())
    }

    fn detach(&mut self) {
        match self.session.take() {
            Some(session) => {
                session.detach(false);
                println!("Detached.");
            }
            None => println!("Not attached."),
        }
    }

    async fn rotate(&mut self) -> Result<(), CliError> {
        let Some(session) = self.session.take() else {
            println!("Not attached.");
            return Ok(());
        };
        session.detach_for_reconfiguration();
        self.session = Some(self.handle.attach().await?);
        println!("Reconfigured.");
        Ok(())
    }

    async fn print_status(&self) -> Result<(), CliError> {
        let snapshot = self.coordinator().snapshot().await?;
        println!("  attachment:  {}", snapshot.attachment);
        println!("  tracking:    {}", snapshot.tracking);
        println!("  preference:  {}", snapshot.tracking_preference);
        println!("  indicator:   {}", snapshot.indicator_visible);
        println!("  presence:    {:?}", snapshot.presence);
        println!("  permission:  {}", self.provider.has_permission());
        println!("  fixes:       {}", snapshot.fixes_received);
        println!(
            "  last fix:    {}",
            fix::describe(snapshot.latest_fix.as_ref())
        );
        if snapshot.cancel_pending {
            println!("  {}", style("cancellation pending").yellow());
        }
        Ok(())
    }
}

/// Next fix for the attached session, or pending forever when detached.
async fn next_fix(session: &mut Option<ConsumerSession>) -> Option<LocationFix> {
    match session {
        Some(session) => session.next_fix().await,
        None => std::future::pending().await,
    }
}

fn prompt() {
    print!("{} ", style(">").cyan());
    let _ = std::io::stdout().flush();
}

fn print_help() {
    for (command, description) in HELP {
        println!("  {:<16} {}", style(command).bold(), description);
    }
}
