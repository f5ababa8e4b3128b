//! # State shared by the branches of one invocation.
//!
//! An [`Invocation`] is built by [`Retrier::run`](crate::Retrier::run) and
//! borrowed by every branch and attempt. It owns the normalized config, the
//! shared [`AttemptBudget`] and the root cancellation token from which
//! per-attempt tokens are derived.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    config::RetryConfig,
    core::budget::AttemptBudget,
    events::{Bus, Event, EventKind},
};

/// Global invocation id counter.
static INVOCATION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Borrowed view of everything one `run` call needs.
pub(crate) struct Invocation<'a, Q: ?Sized, V: ?Sized> {
    pub(crate) id: u64,
    pub(crate) cfg: RetryConfig,
    pub(crate) name: Arc<str>,
    pub(crate) query: &'a Q,
    pub(crate) validator: &'a V,
    pub(crate) bus: &'a Bus,
    pub(crate) budget: AttemptBudget,
    pub(crate) root: CancellationToken,
}

impl<'a, Q: ?Sized, V: ?Sized> Invocation<'a, Q, V> {
    pub(crate) fn new(
        cfg: RetryConfig,
        name: &str,
        query: &'a Q,
        validator: &'a V,
        bus: &'a Bus,
    ) -> Self {
        Self {
            id: INVOCATION_SEQ.fetch_add(1, Ordering::Relaxed),
            budget: AttemptBudget::new(cfg.budget()),
            cfg,
            name: Arc::from(name),
            query,
            validator,
            bus,
            root: CancellationToken::new(),
        }
    }

    /// Publishes an event tagged with this invocation, if anyone listens.
    ///
    /// `build` receives a pre-tagged event and is skipped without receivers.
    pub(crate) fn publish(&self, kind: EventKind, build: impl FnOnce(Event) -> Event) {
        if !self.bus.has_receivers() {
            return;
        }
        let ev = Event::new(kind)
            .with_invocation(self.id)
            .with_query(Arc::clone(&self.name));
        self.bus.publish(build(ev));
    }
}
