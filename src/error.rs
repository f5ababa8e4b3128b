//! Error types returned by a retry invocation.
//!
//! [`RetryError`] is the terminal failure of one invocation. Only the failure of
//! the attempt that exhausts the retry budget is surfaced; every earlier failure
//! is turned into a retry by the orchestrator.
//!
//! Each variant records how many attempts were spent, and the type provides
//! helper methods (`as_label`, `as_message`) for logs and metrics.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// # Terminal failure of a retry invocation.
///
/// Generic over the query's error type `E` and response type `R`:
/// - `QueryFailed` hands back the query's own error, unwrapped;
/// - `ValidationExhausted` hands back the last response the validator rejected.
///
/// `max_retry == 0` produces the same variants as a spent budget; there is no
/// separate "no retries configured" error.
#[non_exhaustive]
#[derive(Error)]
pub enum RetryError<E, R> {
    /// The final attempt hit its deadline before the query answered.
    #[error("timeout reached after {attempts} attempt(s) ({timeout:?} per attempt)")]
    TimeoutExceeded {
        /// The per-attempt timeout that was exceeded.
        timeout: Duration,
        /// Total attempts spent by the invocation.
        attempts: u32,
    },

    /// Responses arrived, but the validator accepted none of them.
    #[error("validator found no valid responses after {attempts} attempt(s)")]
    ValidationExhausted {
        /// The last response rejected by the validator.
        response: R,
        /// Total attempts spent by the invocation.
        attempts: u32,
    },

    /// The query itself failed on the final attempt.
    #[error("query failed after {attempts} attempt(s): {error}")]
    QueryFailed {
        /// The error returned by the query.
        error: E,
        /// Total attempts spent by the invocation.
        attempts: u32,
    },

    /// The detached query task panicked on the final attempt.
    #[error("query panicked after {attempts} attempt(s): {reason}")]
    QueryPanicked {
        /// Panic payload rendered as text.
        reason: String,
        /// Total attempts spent by the invocation.
        attempts: u32,
    },
}

// Manual impl: `R` is caller data and is not required to be `Debug`.
impl<E: fmt::Debug, R> fmt::Debug for RetryError<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::TimeoutExceeded { timeout, attempts } => f
                .debug_struct("TimeoutExceeded")
                .field("timeout", timeout)
                .field("attempts", attempts)
                .finish(),
            RetryError::ValidationExhausted { attempts, .. } => f
                .debug_struct("ValidationExhausted")
                .field("attempts", attempts)
                .finish_non_exhaustive(),
            RetryError::QueryFailed { error, attempts } => f
                .debug_struct("QueryFailed")
                .field("error", error)
                .field("attempts", attempts)
                .finish(),
            RetryError::QueryPanicked { reason, attempts } => f
                .debug_struct("QueryPanicked")
                .field("reason", reason)
                .field("attempts", attempts)
                .finish(),
        }
    }
}

impl<E, R> RetryError<E, R> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use queryvisor::RetryError;
    /// use std::time::Duration;
    ///
    /// let err: RetryError<std::io::Error, ()> = RetryError::TimeoutExceeded {
    ///     timeout: Duration::from_millis(200),
    ///     attempts: 1,
    /// };
    /// assert_eq!(err.as_label(), "retry_timeout_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RetryError::TimeoutExceeded { .. } => "retry_timeout_exceeded",
            RetryError::ValidationExhausted { .. } => "retry_validation_exhausted",
            RetryError::QueryFailed { .. } => "retry_query_failed",
            RetryError::QueryPanicked { .. } => "retry_query_panicked",
        }
    }

    /// Returns the number of attempts the invocation spent before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::TimeoutExceeded { attempts, .. }
            | RetryError::ValidationExhausted { attempts, .. }
            | RetryError::QueryFailed { attempts, .. }
            | RetryError::QueryPanicked { attempts, .. } => *attempts,
        }
    }

    /// Returns `true` if the final attempt timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RetryError::TimeoutExceeded { .. })
    }

    /// Returns the last rejected response, if validation was exhausted.
    pub fn response(&self) -> Option<&R> {
        match self {
            RetryError::ValidationExhausted { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Consumes the error and returns the last rejected response, if any.
    pub fn into_response(self) -> Option<R> {
        match self {
            RetryError::ValidationExhausted { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Returns the query's own error, if the final attempt failed with one.
    pub fn query_error(&self) -> Option<&E> {
        match self {
            RetryError::QueryFailed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Consumes the error and returns the query's own error, if any.
    pub fn into_query_error(self) -> Option<E> {
        match self {
            RetryError::QueryFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl<E: fmt::Display, R> RetryError<E, R> {
    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RetryError::TimeoutExceeded { timeout, attempts } => {
                format!("timeout: {timeout:?} per attempt; attempts={attempts}")
            }
            RetryError::ValidationExhausted { attempts, .. } => {
                format!("no valid response; attempts={attempts}")
            }
            RetryError::QueryFailed { error, attempts } => {
                format!("error: {error}; attempts={attempts}")
            }
            RetryError::QueryPanicked { reason, attempts } => {
                format!("panic: {reason}; attempts={attempts}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Err = RetryError<String, Vec<u8>>;

    #[test]
    fn test_labels_are_stable() {
        let timeout: Err = RetryError::TimeoutExceeded {
            timeout: Duration::from_millis(10),
            attempts: 3,
        };
        let invalid: Err = RetryError::ValidationExhausted {
            response: vec![1],
            attempts: 2,
        };
        let failed: Err = RetryError::QueryFailed {
            error: "boom".into(),
            attempts: 1,
        };
        let panicked: Err = RetryError::QueryPanicked {
            reason: "oops".into(),
            attempts: 4,
        };

        assert_eq!(timeout.as_label(), "retry_timeout_exceeded");
        assert_eq!(invalid.as_label(), "retry_validation_exhausted");
        assert_eq!(failed.as_label(), "retry_query_failed");
        assert_eq!(panicked.as_label(), "retry_query_panicked");
        assert_eq!(timeout.attempts(), 3);
        assert_eq!(invalid.attempts(), 2);
        assert_eq!(failed.attempts(), 1);
        assert_eq!(panicked.attempts(), 4);
    }

    #[test]
    fn test_accessors_expose_payloads() {
        let invalid: Err = RetryError::ValidationExhausted {
            response: vec![7, 8],
            attempts: 2,
        };
        assert_eq!(invalid.response(), Some(&vec![7, 8]));
        assert!(invalid.query_error().is_none());
        assert_eq!(invalid.into_response(), Some(vec![7, 8]));

        let failed: Err = RetryError::QueryFailed {
            error: "refused".into(),
            attempts: 1,
        };
        assert!(!failed.is_timeout());
        assert_eq!(failed.query_error().map(String::as_str), Some("refused"));
        assert_eq!(failed.into_query_error().as_deref(), Some("refused"));
    }

    #[test]
    fn test_display_and_message() {
        let failed: Err = RetryError::QueryFailed {
            error: "refused".into(),
            attempts: 2,
        };
        assert_eq!(
            failed.to_string(),
            "query failed after 2 attempt(s): refused"
        );
        assert_eq!(failed.as_message(), "error: refused; attempts=2");

        let invalid: Err = RetryError::ValidationExhausted {
            response: vec![],
            attempts: 3,
        };
        assert_eq!(
            invalid.to_string(),
            "validator found no valid responses after 3 attempt(s)"
        );
    }
}
