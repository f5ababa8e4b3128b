//! # queryvisor
//!
//! **Queryvisor** runs an async query with a per-attempt timeout and a retry
//! budget, and settles on the first response a validator accepts.
//!
//! It is a building block for clients that talk to slow or flaky backends:
//! a failing, rejected or timed-out attempt is retried until the budget is
//! spent, and the failure of the final attempt is what the caller sees.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!            query + validator + RetryOptions
//!                          │
//!                          ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Retrier                                                          │
//! │  - RetryOptions merged over defaults, normalized to RetryConfig   │
//! │  - Bus (broadcast events)                                         │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator (one per invocation, shared AttemptBudget)          │
//! │                                                                   │
//! │  plain loop:    attempt ─► attempt ─► attempt ─► ...              │
//! │                                                                   │
//! │  keep-alive:    kept-alive attempt (no deadline) ──────────┐      │
//! │                 ── delay ──► overlap attempt ─► ... ───────┤      │
//! │                                     first settlement wins ◄┘      │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ Publishes events:
//!        │ - AttemptStarting / AttemptSucceeded / AttemptRejected
//!        │ - AttemptFailed / TimeoutHit
//!        │ - OverlapScheduled / OverlapStarted / Settled / Exhausted
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                           (per-sub queues)
//!                        ┌─────────┼─────────┐
//!                        ▼         ▼         ▼
//!                    worker1   worker2   workerN
//! ```
//!
//! ### Attempt lifecycle
//! ```text
//! budget.acquire() ─► publish AttemptStarting
//!   ─► tokio::spawn(query.spawn(ctx))  (detached, never aborted)
//!   ─► race against deadline
//!        ├─ Ok, validator true   ─► Valid     (settles)
//!        ├─ Ok, validator false  ─► Invalid   (retry or ValidationExhausted)
//!        ├─ Err / panic          ─► Failed    (retry or QueryFailed / QueryPanicked)
//!        └─ deadline             ─► TimedOut  (retry or TimeoutExceeded)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                       |
//! |-------------------|---------------------------------------------------------------|------------------------------------------|
//! | **Queries**       | Define queries as closures or trait objects.                  | [`Query`], [`QueryFn`], [`QueryRef`]     |
//! | **Validation**    | Decide which responses settle the invocation.                 | [`Validate`], [`accept_all`]             |
//! | **Configuration** | Caller options and their normalized form.                     | [`RetryOptions`], [`RetryConfig`]        |
//! | **Orchestration** | Long-lived handle with defaults and subscribers.              | [`Retrier`], [`RetrierBuilder`]          |
//! | **Subscriber API**| Hook into attempt lifecycle events.                           | [`Subscribe`], [`Event`], [`EventKind`]  |
//! | **Errors**        | Typed terminal failures carrying the last attempt's payload.  | [`RetryError`]                           |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use queryvisor::{RetryError, RetryOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let calls = Arc::new(AtomicU32::new(0));
//!     let counter = Arc::clone(&calls);
//!
//!     // Responds with the call number; only the third one is acceptable.
//!     let res: Result<u32, RetryError<String, u32>> = queryvisor::run(
//!         move || {
//!             let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
//!             async move { Ok(n) }
//!         },
//!         |n: &u32| *n == 3,
//!         RetryOptions::new().with_max_retry(5).with_timeout_ms(500),
//!     )
//!     .await;
//!
//!     assert_eq!(res.ok(), Some(3));
//!     assert_eq!(calls.load(Ordering::SeqCst), 3);
//! }
//! ```

use std::future::Future;

mod config;
mod core;
mod error;
mod events;
mod queries;
mod subscribers;

// ---- Public re-exports ----

pub use config::{RetryConfig, RetryOptions};
pub use core::{Retrier, RetrierBuilder};
pub use error::RetryError;
pub use events::{Branch, Bus, Event, EventKind};
pub use queries::{
    accept_all, AcceptAll, AttemptContext, BoxQueryFuture, Query, QueryFn, QueryRef, Validate,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

/// Runs `query` with `options` on a one-off [`Retrier`] without subscribers.
///
/// `query` is called once per attempt. The first response accepted by
/// `validator` is returned; otherwise the failure of the attempt that spent
/// the last of the `max_retry + 1` budget.
pub async fn run<F, Fut, R, E, V>(
    query: F,
    validator: V,
    options: RetryOptions,
) -> Result<R, RetryError<E, R>>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    V: Validate<R>,
{
    let retrier = Retrier::builder().with_bus_capacity(1).build();
    retrier.run_fn("query", query, &validator, options).await
}
