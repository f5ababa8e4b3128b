//! # Retry configuration.
//!
//! Two layers:
//! 1. [`RetryOptions`]: what a caller writes. Every field is optional and numeric
//!    fields are signed, so out-of-range input can be expressed.
//! 2. [`RetryConfig`]: the canonical form the orchestrator runs with. Built from
//!    options merged over defaults; immutable once normalized.
//!
//! Normalization never fails; it clamps:
//! - `max_retry < 0` or absent → `0` (single attempt)
//! - `timeout_ms < 0` or absent → `0` (no timeout)
//!
//! ## Sentinel values
//! - `timeout = 0s` → no deadline per attempt (see [`RetryConfig::attempt_timeout`])
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use queryvisor::{RetryConfig, RetryOptions};
//!
//! let cfg = RetryConfig::from(
//!     RetryOptions::new().with_max_retry(-3).with_timeout_ms(250),
//! );
//! assert_eq!(cfg.max_retry, 0);
//! assert_eq!(cfg.attempt_timeout(), Some(Duration::from_millis(250)));
//! assert_eq!(cfg.budget(), 1);
//! ```

use std::time::Duration;

/// Caller-supplied, partial retry options.
///
/// Unset fields fall back to the layer below when merged
/// (per-call options → retrier defaults → built-in defaults).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryOptions {
    /// Retries allowed after the first attempt. Negative values clamp to `0`.
    pub max_retry: Option<i64>,
    /// Per-attempt timeout in milliseconds. `0` or negative disables it.
    pub timeout_ms: Option<i64>,
    /// Keep the first attempt awaiting past its timeout while retries run.
    pub keep_first_alive: Option<bool>,
    /// Cancel the attempt token of attempts whose result is abandoned.
    pub cancel_abandoned: Option<bool>,
}

impl RetryOptions {
    /// Creates empty options (every field falls back to defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of retries after the first attempt.
    pub fn with_max_retry(mut self, max_retry: i64) -> Self {
        self.max_retry = Some(max_retry);
        self
    }

    /// Sets the per-attempt timeout in milliseconds.
    pub fn with_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Sets the per-attempt timeout from a [`Duration`] (saturating at `i64::MAX` ms).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let ms = timeout.as_millis().min(i64::MAX as u128) as i64;
        self.timeout_ms = Some(ms);
        self
    }

    /// Enables or disables overlap mode.
    pub fn with_keep_first_alive(mut self, keep: bool) -> Self {
        self.keep_first_alive = Some(keep);
        self
    }

    /// Enables or disables signalling abandoned attempts through their token.
    pub fn with_cancel_abandoned(mut self, cancel: bool) -> Self {
        self.cancel_abandoned = Some(cancel);
        self
    }

    /// Returns `self` with unset fields taken from `defaults`.
    pub fn merged_over(self, defaults: &RetryOptions) -> RetryOptions {
        RetryOptions {
            max_retry: self.max_retry.or(defaults.max_retry),
            timeout_ms: self.timeout_ms.or(defaults.timeout_ms),
            keep_first_alive: self.keep_first_alive.or(defaults.keep_first_alive),
            cancel_abandoned: self.cancel_abandoned.or(defaults.cancel_abandoned),
        }
    }
}

/// Canonical configuration of one retry invocation.
///
/// ## Field semantics
/// - `max_retry`: retries after the first attempt; the budget is `max_retry + 1`
///   attempts shared by every branch of the invocation
/// - `timeout`: per-attempt deadline (`0s` = none)
/// - `keep_first_alive`: overlap mode, only effective with `max_retry > 0` and a timeout
/// - `cancel_abandoned`: cancel the [`AttemptContext`](crate::AttemptContext) token of
///   attempts that time out or lose the race
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt.
    pub max_retry: u32,
    /// Per-attempt timeout (`Duration::ZERO` = disabled).
    pub timeout: Duration,
    /// Keep the first attempt alive past its timeout.
    pub keep_first_alive: bool,
    /// Signal abandoned attempts through their cancellation token.
    pub cancel_abandoned: bool,
}

impl RetryConfig {
    /// Total attempts permitted across all branches (`max_retry + 1`).
    #[inline]
    pub fn budget(&self) -> u32 {
        self.max_retry.saturating_add(1)
    }

    /// Returns the per-attempt timeout as an `Option`.
    ///
    /// - `None` → no deadline
    /// - `Some(d)` → each attempt races a `d` deadline
    #[inline]
    pub fn attempt_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns `true` if the invocation runs the kept-alive and overlap branches.
    ///
    /// Requires `keep_first_alive`, at least one retry and a timeout; otherwise the
    /// plain sequential loop is used.
    #[inline]
    pub fn overlap_enabled(&self) -> bool {
        self.keep_first_alive && self.max_retry > 0 && self.timeout > Duration::ZERO
    }
}

impl Default for RetryConfig {
    /// Default configuration:
    ///
    /// - `max_retry = 0` (single attempt)
    /// - `timeout = 0s` (no timeout)
    /// - `keep_first_alive = false`
    /// - `cancel_abandoned = false` (abandoned queries are left untouched)
    fn default() -> Self {
        Self {
            max_retry: 0,
            timeout: Duration::ZERO,
            keep_first_alive: false,
            cancel_abandoned: false,
        }
    }
}

impl From<RetryOptions> for RetryConfig {
    fn from(opts: RetryOptions) -> Self {
        let defaults = RetryConfig::default();

        let max_retry = match opts.max_retry {
            Some(n) if n > 0 => n.min(i64::from(u32::MAX - 1)) as u32,
            _ => defaults.max_retry,
        };
        let timeout = match opts.timeout_ms {
            Some(ms) if ms > 0 => Duration::from_millis(ms as u64),
            _ => defaults.timeout,
        };

        Self {
            max_retry,
            timeout,
            keep_first_alive: opts.keep_first_alive.unwrap_or(defaults.keep_first_alive),
            cancel_abandoned: opts.cancel_abandoned.unwrap_or(defaults.cancel_abandoned),
        }
    }
}
