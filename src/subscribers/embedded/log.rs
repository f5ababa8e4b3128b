//! # Structured event logger (`LogWriter`)
//!
//! A subscriber that renders incoming [`Event`]s through `tracing`, one record per
//! event, with the event metadata as structured fields.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  invocation started query="fetch" invocation=3 budget=3 timeout_ms=150
//! DEBUG attempt starting query="fetch" attempt=1 branch=kept_alive
//! WARN  attempt timed out query="fetch" attempt=2 branch=overlap timeout_ms=150
//! INFO  settled query="fetch" attempt=1 branch=kept_alive
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let query = e.query.as_deref().unwrap_or("unknown");
        let branch = e.branch.map(|b| b.as_str()).unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::InvocationStarted => {
                info!(
                    query,
                    invocation = e.invocation,
                    budget = e.budget,
                    timeout_ms = e.timeout_ms,
                    branch,
                    "invocation started"
                );
            }
            EventKind::AttemptStarting => {
                debug!(
                    query,
                    invocation = e.invocation,
                    attempt = e.attempt,
                    branch,
                    timeout_ms = e.timeout_ms,
                    "attempt starting"
                );
            }
            EventKind::AttemptSucceeded => {
                debug!(
                    query,
                    invocation = e.invocation,
                    attempt = e.attempt,
                    branch,
                    "attempt succeeded"
                );
            }
            EventKind::AttemptRejected => {
                debug!(
                    query,
                    invocation = e.invocation,
                    attempt = e.attempt,
                    branch,
                    "response rejected by validator"
                );
            }
            EventKind::AttemptFailed => {
                warn!(
                    query,
                    invocation = e.invocation,
                    attempt = e.attempt,
                    branch,
                    err = reason,
                    "attempt failed"
                );
            }
            EventKind::TimeoutHit => {
                warn!(
                    query,
                    invocation = e.invocation,
                    attempt = e.attempt,
                    branch,
                    timeout_ms = e.timeout_ms,
                    "attempt timed out"
                );
            }
            EventKind::OverlapScheduled => {
                debug!(
                    query,
                    invocation = e.invocation,
                    delay_ms = e.delay_ms,
                    "overlap retries scheduled"
                );
            }
            EventKind::OverlapStarted => {
                info!(query, invocation = e.invocation, "overlap retries started");
            }
            EventKind::Settled => {
                info!(
                    query,
                    invocation = e.invocation,
                    attempt = e.attempt,
                    branch,
                    "settled"
                );
            }
            EventKind::Exhausted => {
                warn!(
                    query,
                    invocation = e.invocation,
                    attempts = e.attempt,
                    branch,
                    err = reason,
                    "retries exhausted"
                );
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = query, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = query, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
