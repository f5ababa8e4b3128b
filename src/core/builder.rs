use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::retrier::{spawn_listener, Retrier};
use crate::{
    config::RetryOptions,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Default event bus capacity.
const DEFAULT_BUS_CAPACITY: usize = 1024;

/// Builder for constructing a [`Retrier`] with defaults and subscribers.
pub struct RetrierBuilder {
    defaults: RetryOptions,
    subscribers: Vec<Arc<dyn Subscribe>>,
    bus_capacity: usize,
}

impl Default for RetrierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetrierBuilder {
    /// Creates a builder with built-in defaults and no subscribers.
    pub fn new() -> Self {
        Self {
            defaults: RetryOptions::default(),
            subscribers: Vec::new(),
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }

    /// Sets the options every call's own options are merged over.
    pub fn with_defaults(mut self, defaults: RetryOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive invocation and attempt events through dedicated
    /// workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the event bus capacity (clamped to at least 1).
    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity.max(1);
        self
    }

    /// Builds the retrier.
    ///
    /// With subscribers configured this spawns the subscriber workers and the
    /// bus listener, so it must be called within a tokio runtime.
    pub fn build(self) -> Retrier {
        let bus = Bus::new(self.bus_capacity);
        let stop = CancellationToken::new();
        if self.subscribers.is_empty() {
            return Retrier::new_internal(self.defaults, bus, None, None, stop);
        }

        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let listener = spawn_listener(&bus, Arc::clone(&subs), stop.clone());

        Retrier::new_internal(self.defaults, bus, Some(subs), Some(listener), stop)
    }
}
