//! # Retrier: runs invocations and fans their events out to subscribers.
//!
//! The [`Retrier`] owns the event bus, an optional [`SubscriberSet`] and the
//! default [`RetryOptions`] that per-call options are merged over. It is cheap
//! to share behind an `Arc` and can run any number of invocations concurrently;
//! nothing is shared between invocations except the bus.
//!
//! ## High-level architecture
//! ```text
//! run(query, validator, options)
//!   ├─► RetryConfig::from(options.merged_over(defaults))
//!   ├─► Invocation { budget, root token, bus }
//!   ├─► publish InvocationStarted
//!   ├─► orchestrate()  ── plain loop | kept-alive + overlap
//!   └─► publish Settled | Exhausted, return result
//!
//! Event flow (only when subscribers are configured):
//!   runner / orchestrator ── publish(Event) ──► Bus ──► listener task ──► SubscriberSet::emit(&Event)
//! ```
//!
//! ## Example
//! ```rust
//! use queryvisor::{Retrier, RetryOptions, RetryError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let retrier = Retrier::builder()
//!         .with_defaults(RetryOptions::new().with_max_retry(2))
//!         .build();
//!
//!     let res: Result<u32, RetryError<std::io::Error, u32>> = retrier
//!         .run_fn("answer", || async { Ok(42) }, &|n: &u32| *n == 42, RetryOptions::new())
//!         .await;
//!     assert_eq!(res.ok(), Some(42));
//! }
//! ```

use std::{borrow::Cow, future::Future, sync::Arc};

use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{
    config::{RetryConfig, RetryOptions},
    core::{builder::RetrierBuilder, invocation::Invocation, orchestrator::orchestrate},
    error::RetryError,
    events::{Branch, Bus, EventKind},
    queries::{AttemptContext, Query, QueryFn, Validate},
    subscribers::SubscriberSet,
};

/// Runs retry invocations and delivers their events (via [`SubscriberSet`]).
pub struct Retrier {
    defaults: RetryOptions,
    bus: Bus,
    subs: Option<Arc<SubscriberSet>>,
    listener: Option<JoinHandle<()>>,
    stop: DropGuard,
}

impl Default for Retrier {
    fn default() -> Self {
        Self::new()
    }
}

impl Retrier {
    /// Creates a retrier with built-in defaults and no subscribers.
    ///
    /// Does not spawn anything, so it can be created outside a runtime.
    pub fn new() -> Self {
        RetrierBuilder::new().build()
    }

    /// Returns a builder for configuring defaults and subscribers.
    pub fn builder() -> RetrierBuilder {
        RetrierBuilder::new()
    }

    pub(crate) fn new_internal(
        defaults: RetryOptions,
        bus: Bus,
        subs: Option<Arc<SubscriberSet>>,
        listener: Option<JoinHandle<()>>,
        stop: CancellationToken,
    ) -> Self {
        Self {
            defaults,
            bus,
            subs,
            listener,
            stop: stop.drop_guard(),
        }
    }

    /// Default options applied under every call's own options.
    pub fn defaults(&self) -> &RetryOptions {
        &self.defaults
    }

    /// The bus events are published on; `subscribe()` to observe them directly.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs `query` until a response passes `validator` or the budget is spent.
    ///
    /// `options` are merged over the retrier's defaults, then normalized (see
    /// [`RetryConfig`]). Only the failure of the attempt that exhausts the
    /// budget is returned; all earlier failures become retries.
    pub async fn run<Q, V>(
        &self,
        query: &Q,
        validator: &V,
        options: RetryOptions,
    ) -> Result<Q::Response, RetryError<Q::Error, Q::Response>>
    where
        Q: Query + ?Sized,
        V: Validate<Q::Response> + ?Sized,
    {
        let cfg = RetryConfig::from(options.merged_over(&self.defaults));
        let inv = Invocation::new(cfg, query.name(), query, validator, &self.bus);
        let _abandon_on_exit = cfg.cancel_abandoned.then(|| inv.root.clone().drop_guard());

        inv.publish(EventKind::InvocationStarted, |ev| {
            let branch = if cfg.overlap_enabled() {
                Branch::KeptAlive
            } else {
                Branch::Sequential
            };
            let ev = ev.with_budget(inv.budget.limit()).with_branch(branch);
            match cfg.attempt_timeout() {
                Some(timeout) => ev.with_timeout(timeout),
                None => ev,
            }
        });

        let settled = orchestrate(&inv).await;

        match &settled.result {
            Ok(_) => inv.publish(EventKind::Settled, |ev| {
                ev.with_attempt(settled.attempt).with_branch(settled.branch)
            }),
            Err(err) => inv.publish(EventKind::Exhausted, |ev| {
                ev.with_attempt(err.attempts())
                    .with_branch(settled.branch)
                    .with_reason(err.as_label())
            }),
        }
        settled.result
    }

    /// Runs a closure-backed query; `query` is invoked once per attempt.
    pub async fn run_fn<F, Fut, R, E, V>(
        &self,
        name: impl Into<Cow<'static, str>>,
        query: F,
        validator: &V,
        options: RetryOptions,
    ) -> Result<R, RetryError<E, R>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        V: Validate<R> + ?Sized,
    {
        let query = QueryFn::new(name, move |_ctx: AttemptContext| query());
        self.run(&query, validator, options).await
    }

    /// Stops the event listener and drains every subscriber queue.
    ///
    /// 1. Signals the listener to stop
    /// 2. Awaits the listener, which forwards any buffered events first
    /// 3. Shuts down subscriber workers
    ///
    /// Dropping the retrier without calling this stops the listener too, but
    /// does not wait for subscribers to drain.
    pub async fn shutdown(self) {
        drop(self.stop);
        if let Some(listener) = self.listener {
            let _ = listener.await;
        }
        if let Some(subs) = self.subs.and_then(|s| Arc::try_unwrap(s).ok()) {
            subs.shutdown().await;
        }
    }
}

/// Subscribes to the bus and forwards events to the subscriber set until `stop`.
///
/// Lagged receivers skip the lost events. On `stop`, events already buffered
/// in the receiver are forwarded before the task exits.
pub(crate) fn spawn_listener(
    bus: &Bus,
    set: Arc<SubscriberSet>,
    stop: CancellationToken,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => {
                    while let Ok(ev) = rx.try_recv() {
                        set.emit(&ev);
                    }
                    break;
                }
            }
        }
    })
}
