//! # Event bus for broadcasting retry events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from every part of an invocation.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                     Listener (one per Retrier):
//!   Orchestrator ──┐
//!   Kept-alive   ──┼──────► Bus ───────► retrier listener ────► SubscriberSet
//!   Overlap      ──┤  (broadcast chan)
//!   Runner       ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time,
//!   which is the normal case for a retrier built without subscribers.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for retry events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Returns `true` if at least one receiver is attached.
    ///
    /// Publishers use this to skip building events nobody will see.
    #[inline]
    pub fn has_receivers(&self) -> bool {
        self.tx.receiver_count() > 0
    }
}
