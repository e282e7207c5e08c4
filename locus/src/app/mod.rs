//! Application wiring and process lifecycle.
//!
//! [`LocationServiceHost`] is the process entry point: it turns
//! [`StartCommand`](crate::coordinator::StartCommand)s into either a freshly
//! spawned coordinator or a re-entry into the one already running, and owns
//! its shutdown.
//!
//! # Example
//!
//! ```ignore
//! use locus::app::{AppConfig, LocationServiceHost};
//! use locus::config::ConfigFile;
//! use locus::coordinator::StartCommand;
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?);
//! let runtime = locus::app::build_runtime()?;
//! runtime.block_on(async {
//!     let (host, provider) = LocationServiceHost::simulated(&config, indicator)?;
//!     let handle = host.start(StartCommand::Start)?;
//!     // ...
//!     host.shutdown().await;
//! });
//! ```

mod config;
mod error;
mod host;

pub use config::AppConfig;
pub use error::AppError;
pub use host::{build_runtime, LocationServiceHost};
