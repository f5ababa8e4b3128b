//! # Per-attempt deadline.
//!
//! A [`Deadline`] is created once per attempt and raced against that attempt's
//! query. A disabled timeout is represented as "no competing deadline": racing
//! it is exactly awaiting the query alone, with no never-firing timer left
//! behind.
//!
//! ```text
//! Deadline::after(200ms).race(query)  ── query first ──► Ok(output)
//!                                     └─ 200ms first ──► Err(Elapsed(200ms)), query dropped by caller
//! Deadline::none().race(query)        ──────────────────► Ok(output)
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time;

/// The deadline fired before the raced future completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Elapsed(pub Duration);

/// Optional timer raced against one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Deadline {
    after: Option<Duration>,
}

impl Deadline {
    /// A deadline firing `timeout` after the race starts (`0` = none).
    pub(crate) fn after(timeout: Duration) -> Self {
        Self {
            after: Some(timeout).filter(|d| *d > Duration::ZERO),
        }
    }

    /// No competing deadline.
    pub(crate) fn none() -> Self {
        Self { after: None }
    }

    /// Builds a deadline from an optional timeout.
    pub(crate) fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map_or_else(Self::none, Self::after)
    }

    /// Returns the configured duration, if any.
    pub(crate) fn duration(&self) -> Option<Duration> {
        self.after
    }

    /// Awaits `fut`, failing with [`Elapsed`] if the deadline fires first.
    ///
    /// The timer starts when the returned future is first polled.
    pub(crate) async fn race<F: Future>(self, fut: F) -> Result<F::Output, Elapsed> {
        match self.after {
            Some(dur) => time::timeout(dur, fut).await.map_err(|_| Elapsed(dur)),
            None => Ok(fut.await),
        }
    }
}
