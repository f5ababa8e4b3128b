//! # Run a single attempt of a query.
//!
//! Executes one attempt with an optional deadline, applies the validator and
//! classifies the result into an [`AttemptOutcome`].
//!
//! - **Spend ONE attempt** from the shared budget before racing
//! - **Spawn the query** as a detached task (never aborted on timeout)
//! - **Race** the task against the attempt's [`Deadline`]
//! - **Publish events** for observability
//!
//! ## Event flow
//!
//! ```text
//! AttemptStarting ─► spawn(query) ─► race(deadline)
//!                                      ├─ Ok(resp), validator true  ─► AttemptSucceeded → Valid
//!                                      ├─ Ok(resp), validator false ─► AttemptRejected  → Invalid
//!                                      ├─ Err(e) / panic            ─► AttemptFailed    → Failed / Panicked
//!                                      └─ deadline                  ─► TimeoutHit       → TimedOut
//!                                                                     (query keeps running)
//! ```
//!
//! ## Rules
//! - Publishes **exactly one** outcome event per attempt
//! - Each attempt gets a **child token** of the invocation's root token; it is
//!   cancelled on timeout only when `cancel_abandoned` is enabled
//! - Child cancellation does **not** affect sibling attempts

use std::time::Duration;

use tokio::task::JoinError;

use crate::{
    core::{deadline::Deadline, invocation::Invocation},
    error::RetryError,
    events::{Branch, EventKind},
    queries::{AttemptContext, Query, Validate},
    subscribers::panic_message,
};

/// Classified result of one attempt.
pub(crate) enum AttemptOutcome<R, E> {
    /// The response passed the validator.
    Valid(R),
    /// The response was rejected by the validator.
    Invalid(R),
    /// The query returned an error.
    Failed(E),
    /// The detached query task panicked or was cancelled by the runtime.
    Panicked(String),
    /// The deadline fired first.
    TimedOut(Duration),
}

impl<R, E> AttemptOutcome<R, E> {
    pub(crate) fn is_valid(&self) -> bool {
        matches!(self, AttemptOutcome::Valid(_))
    }

    /// Converts the outcome into the invocation result it would settle.
    ///
    /// `attempts` is the number of attempts spent by the whole invocation.
    pub(crate) fn into_result(self, attempts: u32) -> Result<R, RetryError<E, R>> {
        match self {
            AttemptOutcome::Valid(response) => Ok(response),
            AttemptOutcome::Invalid(response) => {
                Err(RetryError::ValidationExhausted { response, attempts })
            }
            AttemptOutcome::Failed(error) => Err(RetryError::QueryFailed { error, attempts }),
            AttemptOutcome::Panicked(reason) => Err(RetryError::QueryPanicked { reason, attempts }),
            AttemptOutcome::TimedOut(timeout) => {
                Err(RetryError::TimeoutExceeded { timeout, attempts })
            }
        }
    }
}

/// Executes one attempt of the invocation's query for `branch`.
///
/// Returns the attempt ordinal together with its outcome.
///
/// ### Timeout behavior
/// If `deadline` carries a duration and it elapses first, the query task is
/// detached (its `JoinHandle` is dropped, which does not abort it) and the
/// outcome is `TimedOut`. With `cancel_abandoned`, the attempt token is
/// cancelled so a cooperative query can stop early.
pub(crate) async fn run_attempt<Q, V>(
    inv: &Invocation<'_, Q, V>,
    branch: Branch,
    deadline: Deadline,
) -> (u32, AttemptOutcome<Q::Response, Q::Error>)
where
    Q: Query + ?Sized,
    V: Validate<Q::Response> + ?Sized,
{
    let attempt = inv.budget.acquire();
    inv.publish(EventKind::AttemptStarting, |ev| {
        let ev = ev.with_attempt(attempt).with_branch(branch);
        match deadline.duration() {
            Some(timeout) => ev.with_timeout(timeout),
            None => ev,
        }
    });

    let token = inv.root.child_token();
    let ctx = AttemptContext::new(attempt, branch, token.clone());
    let handle = tokio::spawn(inv.query.spawn(ctx));

    let outcome = match deadline.race(handle).await {
        Ok(Ok(Ok(response))) => {
            if inv.validator.validate(&response) {
                AttemptOutcome::Valid(response)
            } else {
                AttemptOutcome::Invalid(response)
            }
        }
        Ok(Ok(Err(error))) => AttemptOutcome::Failed(error),
        Ok(Err(join_err)) => AttemptOutcome::Panicked(join_error_reason(join_err)),
        Err(elapsed) => {
            if inv.cfg.cancel_abandoned {
                token.cancel();
            }
            AttemptOutcome::TimedOut(elapsed.0)
        }
    };

    publish_outcome(inv, branch, attempt, &outcome);
    (attempt, outcome)
}

/// Publishes the single outcome event of an attempt.
fn publish_outcome<Q: ?Sized, V: ?Sized, R, E>(
    inv: &Invocation<'_, Q, V>,
    branch: Branch,
    attempt: u32,
    outcome: &AttemptOutcome<R, E>,
) {
    let kind = match outcome {
        AttemptOutcome::Valid(_) => EventKind::AttemptSucceeded,
        AttemptOutcome::Invalid(_) => EventKind::AttemptRejected,
        AttemptOutcome::Failed(_) | AttemptOutcome::Panicked(_) => EventKind::AttemptFailed,
        AttemptOutcome::TimedOut(_) => EventKind::TimeoutHit,
    };
    inv.publish(kind, |ev| {
        let ev = ev.with_attempt(attempt).with_branch(branch);
        match outcome {
            AttemptOutcome::Failed(_) => ev.with_reason("query returned an error"),
            AttemptOutcome::Panicked(reason) => ev.with_reason(format!("panic: {reason}")),
            AttemptOutcome::TimedOut(timeout) => ev.with_timeout(*timeout),
            _ => ev,
        }
    });
}

fn join_error_reason(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic().as_ref())
    } else {
        "query task cancelled by the runtime".to_string()
    }
}
