//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the retrier, the orchestrator
//! branches, the attempt runner and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`Branch`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Retrier::run`, the orchestrator, `runner::run_attempt`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the retrier's listener task, which fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Branch, Event, EventKind};
