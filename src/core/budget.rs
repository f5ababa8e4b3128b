//! # Shared attempt budget.
//!
//! One [`AttemptBudget`] exists per invocation and is shared by every branch.
//! The counter is advanced atomically by the attempt runner before each race,
//! so both branches in overlap mode observe one consistent, monotonically
//! increasing value and collectively respect `max_retry + 1` attempts.
//!
//! ## Rules
//! - `acquire()` spends one attempt and returns its 1-based ordinal
//! - `is_exhausted()` is evaluated by a branch after its own attempt concluded;
//!   it may observe attempts spent by the sibling branch
//! - a branch only loops again while `!is_exhausted()`, so the total never
//!   exceeds the limit

use std::sync::atomic::{AtomicU32, Ordering};

/// Attempt counter shared by all branches of one invocation.
#[derive(Debug)]
pub(crate) struct AttemptBudget {
    limit: u32,
    spent: AtomicU32,
}

impl AttemptBudget {
    /// Creates a budget of `limit` attempts (at least 1).
    pub(crate) fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            spent: AtomicU32::new(0),
        }
    }

    /// Spends one attempt and returns its ordinal (1-based).
    pub(crate) fn acquire(&self) -> u32 {
        let prev = self
            .spent
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1))
            .unwrap_or(u32::MAX);
        prev.saturating_add(1)
    }

    /// Attempts spent so far.
    pub(crate) fn spent(&self) -> u32 {
        self.spent.load(Ordering::Acquire)
    }

    /// Total attempts permitted.
    pub(crate) fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns `true` once every permitted attempt has been spent.
    pub(crate) fn is_exhausted(&self) -> bool {
        self.spent() >= self.limit
    }
}
