//! # Observing invocations with [`Subscribe`].
//!
//! Subscribers registered on a [`RetrierBuilder`](crate::RetrierBuilder)
//! receive every event the retrier publishes. Delivery is best effort: an
//! invocation never waits on a subscriber, and an event that does not fit in a
//! subscriber's queue is dropped for that subscriber and reported as
//! `SubscriberOverflow`. Within one subscriber, events arrive in publish order.
//!
//! [`Retrier::shutdown`](crate::Retrier::shutdown) waits until queued events
//! have been handled; dropping the retrier does not.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! use async_trait::async_trait;
//! use queryvisor::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct TimeoutCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for TimeoutCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::TimeoutHit {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "timeout-counter"
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receives retry events on its own worker task.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    ///
    /// A panic here is caught and published as `SubscriberPanicked`, unless the
    /// event being handled was itself a panic report.
    async fn on_event(&self, event: &Event);

    /// Name reported in this subscriber's overflow and panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue size for this subscriber; values below 1 are raised to 1.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
