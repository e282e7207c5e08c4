//! Location-tracking lifecycle coordinator.
//!
//! The coordinator owns the provider subscription, tracks whether a consumer
//! is attached, routes fixes to the consumer or to the background indicator,
//! and keeps the persisted tracking preference in step with the subscription.
//!
//! # Components
//!
//! - [`TrackingCoordinator`] - the single-writer task holding all state
//! - [`CoordinatorHandle`] - cloneable command sender
//! - [`ConsumerSession`] - an attached consumer's view of the fix stream
//!
//! # Example
//!
//! ```ignore
//! use locus::coordinator::{CoordinatorConfig, TrackingCoordinator};
//!
//! let (coordinator, handle) = TrackingCoordinator::new(
//!     CoordinatorConfig::default(),
//!     provider,
//!     indicator,
//!     preferences,
//! );
//! tokio::spawn(coordinator.run(shutdown.clone()));
//!
//! let mut session = handle.attach().await?;
//! handle.subscribe().await?;
//! while let Some(fix) = session.next_fix().await {
//!     println!("Foreground location: {}", fix);
//! }
//! ```

mod command;
mod consumer;
mod error;
mod handle;
mod state;
mod tracker;

pub(crate) use command::{Command, ProviderEvent};
pub use command::{CancelOrigin, StartCommand};
pub use consumer::ConsumerSession;
pub use error::{CancelOutcome, TrackingError};
pub use handle::{CancelTicket, CoordinatorHandle};
pub use state::{
    AttachmentState, CoordinatorConfig, CoordinatorSnapshot, Presence, SubscriptionId,
    TrackingSubscription, DEFAULT_INDICATOR_TITLE, DEFAULT_REATTACH_GRACE,
};
pub use tracker::TrackingCoordinator;
