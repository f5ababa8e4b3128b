//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in implementations for handling events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   runner / orchestrator ── publish(Event) ──► Bus ──► retrier listener
//!                                                            │
//!                                                            └──► SubscriberSet::emit(&Event)
//!                                                                      │
//!                                                            ┌─────────┼─────────┐
//!                                                            ▼         ▼         ▼
//!                                                        LogWriter  Metrics   Custom
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
pub(crate) use subscriber_set::panic_message;
