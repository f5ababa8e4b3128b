//! # Events emitted while a query is being retried.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Invocation events**: one invocation's start and its settlement
//! - **Attempt events**: per-attempt flow (starting, succeeded, rejected, failed, timeout)
//! - **Subscriber events**: delivery problems inside the fan-out
//!
//! The [`Event`] struct carries metadata such as timestamps, query name,
//! attempt ordinal, [`Branch`], and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//! Events of one invocation share the same `invocation` id.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use queryvisor::{Branch, Event, EventKind};
//!
//! let ev = Event::new(EventKind::TimeoutHit)
//!     .with_query("fetch-user")
//!     .with_attempt(2)
//!     .with_branch(Branch::Overlap)
//!     .with_timeout(Duration::from_millis(150));
//!
//! assert_eq!(ev.kind, EventKind::TimeoutHit);
//! assert_eq!(ev.query.as_deref(), Some("fetch-user"));
//! assert_eq!(ev.timeout_ms, Some(150));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of retry events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `query`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `query`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Invocation events ===
    /// An invocation started with a normalized configuration.
    ///
    /// Sets:
    /// - `query`, `invocation`
    /// - `budget`: total attempts allowed (`max_retry + 1`)
    /// - `timeout_ms`: per-attempt timeout (absent when disabled)
    /// - `branch`: `KeptAlive` in overlap mode, `Sequential` otherwise
    InvocationStarted,

    /// The invocation settled with a valid response.
    ///
    /// Sets:
    /// - `query`, `invocation`, `branch`
    /// - `attempt`: ordinal of the winning attempt
    Settled,

    /// The invocation settled with a failure.
    ///
    /// Sets:
    /// - `query`, `invocation`, `branch`
    /// - `attempt`: attempts spent
    /// - `reason`: error label
    Exhausted,

    // === Attempt events ===
    /// An attempt is starting (counter already advanced).
    ///
    /// Sets:
    /// - `query`, `invocation`, `branch`
    /// - `attempt`: attempt ordinal (1-based, shared across branches)
    /// - `timeout_ms`: deadline of this attempt (absent for the kept-alive attempt)
    AttemptStarting,

    /// The attempt's response passed the validator.
    AttemptSucceeded,

    /// The attempt's response was rejected by the validator.
    AttemptRejected,

    /// The query failed (error or panic) for this attempt.
    ///
    /// Sets:
    /// - `reason`: failure message
    AttemptFailed,

    /// The attempt's deadline fired before the query answered.
    ///
    /// Sets:
    /// - `timeout_ms`: configured attempt timeout (ms)
    TimeoutHit,

    /// Overlap retries are scheduled to start after the kept-alive attempt's timeout.
    ///
    /// Sets:
    /// - `delay_ms`: delay before the overlap branch starts
    OverlapScheduled,

    /// The overlap branch started (the invocation was still unsettled).
    OverlapStarted,
}

/// The orchestration branch an attempt or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    /// Plain sequential loop (overlap mode off).
    Sequential,
    /// The first attempt of an overlap invocation, awaited without a deadline.
    KeptAlive,
    /// The deadline-bounded retries started after the first timeout elapsed.
    Overlap,
}

impl Branch {
    /// Returns a short stable label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::Sequential => "sequential",
            Branch::KeptAlive => "kept_alive",
            Branch::Overlap => "overlap",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Invocation id, shared by all events of one `run`.
    pub invocation: Option<u64>,
    /// Name of the query (or subscriber, for subscriber events).
    pub query: Option<Arc<str>>,
    /// Attempt ordinal, 1-based and shared across branches.
    ///
    /// On `Exhausted` this is the number of attempts spent.
    pub attempt: Option<u32>,
    /// Total attempts allowed; only set on `InvocationStarted`.
    pub budget: Option<u32>,
    /// Branch that produced the event.
    pub branch: Option<Branch>,
    /// Attempt timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            invocation: None,
            query: None,
            attempt: None,
            budget: None,
            branch: None,
            timeout_ms: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches an invocation id.
    #[inline]
    pub fn with_invocation(mut self, id: u64) -> Self {
        self.invocation = Some(id);
        self
    }

    /// Attaches a query name.
    #[inline]
    pub fn with_query(mut self, query: impl Into<Arc<str>>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Attaches an attempt ordinal.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches the attempt budget of an invocation.
    #[inline]
    pub fn with_budget(mut self, n: u32) -> Self {
        self.budget = Some(n);
        self
    }

    /// Attaches the producing branch.
    #[inline]
    pub fn with_branch(mut self, branch: Branch) -> Self {
        self.branch = Some(branch);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_query(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_query(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    /// Returns `true` for the two events that end an invocation.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::Settled | EventKind::Exhausted)
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
