//! Locus - foreground-only location tracking
//!
//! This library keeps a location subscription alive across the comings and
//! goings of its consumer. While a consumer is attached, fixes are pushed to it
//! directly; when the consumer goes away for good, fixes are surfaced through a
//! persistent indicator instead. A durable "tracking enabled" preference is
//! kept consistent with the live subscription, including when the location
//! permission disappears mid-flight.
//!
//! # Architecture
//!
//! ```text
//! ConsumerSession ──attach/detach──┐
//!                                  ▼
//! LocationProvider ──fixes──► TrackingCoordinator ──► ConsumerLink (attached)
//!        ▲                         │    │
//!        └──request/remove─────────┘    └──────────► IndicatorChannel (background)
//!                                  │
//!                                  ▼
//!                           PreferenceStore
//! ```
//!
//! Every input is a command on one queue, processed one at a time by the
//! coordinator task.

pub mod app;
pub mod config;
pub mod coordinator;
pub mod fix;
pub mod indicator;
pub mod logging;
pub mod preferences;
pub mod provider;

/// Crate version, as reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
