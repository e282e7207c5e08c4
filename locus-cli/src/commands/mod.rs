//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`run`] - Host the coordinator with an interactive terminal consumer
//! - [`cancel`] - Cancel tracking through the process entry point
//! - [`status`] - Show the persisted tracking preference
//! - [`config`] - Show or initialize configuration

pub mod cancel;
pub mod config;
pub mod run;
pub mod status;
