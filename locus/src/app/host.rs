//! Process entry point hosting the tracking coordinator.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::coordinator::{CoordinatorConfig, CoordinatorHandle, StartCommand, TrackingCoordinator};
use crate::indicator::IndicatorChannel;
use crate::preferences::{FilePreferenceStore, PreferenceStore};
use crate::provider::{LocationProvider, SimulatedProvider};

/// Create the multi-threaded runtime the host runs on.
pub fn build_runtime() -> Result<Runtime, AppError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("locus")
        .build()
        .map_err(|e| AppError::RuntimeCreation(e.to_string()))
}

struct RunningCoordinator {
    handle: CoordinatorHandle,
    task: JoinHandle<()>,
    shutdown: CancellationToken,
}

impl RunningCoordinator {
    fn is_alive(&self) -> bool {
        self.handle.is_running() && !self.task.is_finished()
    }
}

/// Hosts at most one [`TrackingCoordinator`].
///
/// `start` is idempotent: while a coordinator is running, further start
/// commands are delivered to it instead of spawning another.
pub struct LocationServiceHost {
    config: CoordinatorConfig,
    provider: Arc<dyn LocationProvider>,
    indicator: Arc<dyn IndicatorChannel>,
    preferences: Arc<dyn PreferenceStore>,
    running: Mutex<Option<RunningCoordinator>>,
}

impl LocationServiceHost {
    pub fn new(
        config: CoordinatorConfig,
        provider: Arc<dyn LocationProvider>,
        indicator: Arc<dyn IndicatorChannel>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            config,
            provider,
            indicator,
            preferences,
            running: Mutex::new(None),
        }
    }

    /// Wire a host with the simulated provider and the file-backed
    /// preference store named in `config`.
    ///
    /// The provider is returned as well so callers can steer it.
    pub fn simulated(
        config: &AppConfig,
        indicator: Arc<dyn IndicatorChannel>,
    ) -> Result<(Self, SimulatedProvider), AppError> {
        let preferences = FilePreferenceStore::open(&config.preferences_file)?;
        let provider = SimulatedProvider::new(config.simulation.clone());
        let host = Self::new(
            config.coordinator.clone(),
            Arc::new(provider.clone()),
            indicator,
            Arc::new(preferences),
        );
        Ok((host, provider))
    }

    /// Deliver a start command, spawning the coordinator if needed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, command: StartCommand) -> Result<CoordinatorHandle, AppError> {
        let mut running = self.running.lock();

        if let Some(current) = running.as_ref().filter(|r| r.is_alive()) {
            info!(command = ?command, "Delivering start command to running coordinator");
            current.handle.start_command(command)?;
            return Ok(current.handle.clone());
        }

        let (coordinator, handle) = TrackingCoordinator::new(
            self.config.clone(),
            Arc::clone(&self.provider),
            Arc::clone(&self.indicator),
            Arc::clone(&self.preferences),
        );
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(coordinator.run(shutdown.clone()));
        info!(command = ?command, "Tracking coordinator spawned");

        if command == StartCommand::CancelTracking {
            handle.start_command(command)?;
        }

        *running = Some(RunningCoordinator {
            handle: handle.clone(),
            task,
            shutdown,
        });
        Ok(handle)
    }

    /// Handle to the running coordinator, if any.
    pub fn handle(&self) -> Option<CoordinatorHandle> {
        self.running
            .lock()
            .as_ref()
            .filter(|r| r.is_alive())
            .map(|r| r.handle.clone())
    }

    /// Stop the running coordinator and wait for it to finish.
    pub async fn shutdown(&self) {
        let running = self.running.lock().take();
        if let Some(running) = running {
            running.shutdown.cancel();
            let _ = running.task.await;
            info!("Location service host shut down");
        }
    }
}
