//! # Orchestrator: drives the attempts of one invocation to settlement.
//!
//! Two modes, selected by [`RetryConfig::overlap_enabled`](crate::RetryConfig::overlap_enabled):
//!
//! ## Plain loop
//! ```text
//! loop {
//!   ├─► run_attempt(deadline = timeout)      (spends one attempt)
//!   ├─► Valid                 → settle Ok(response)
//!   ├─► budget exhausted      → settle Err(from last outcome)
//!   └─► Invalid/Failed/TimedOut/Panicked → retry
//! }
//! ```
//!
//! ## Overlap mode
//! ```text
//! t=0        kept-alive: run_attempt(deadline = none) ─────────────────────────┐
//! t=timeout  overlap:    plain loop, each attempt bounded by `timeout` ──────┐ │
//!                                                                            ▼ ▼
//!                                             select (biased to kept-alive): first settlement wins
//! ```
//! - the kept-alive attempt is polled first, so it always takes ordinal 1
//! - a non-valid kept-alive outcome settles only if the shared budget is
//!   already exhausted; otherwise the overlap branch decides
//! - the losing branch is dropped; its in-flight query keeps running detached
//!
//! ## Rules
//! - Exactly **one** settlement per invocation (the `select!` is the only arbiter)
//! - Total attempts across both branches never exceed `max_retry + 1`
//! - Within one branch attempts run **sequentially**

use tokio::time;

use crate::{
    core::{
        deadline::Deadline,
        invocation::Invocation,
        runner::{run_attempt, AttemptOutcome},
    },
    error::RetryError,
    events::{Branch, EventKind},
    queries::{Query, Validate},
};

/// The settled result of an invocation and where it came from.
pub(crate) struct Settlement<R, E> {
    /// Branch that settled the invocation.
    pub(crate) branch: Branch,
    /// Ordinal of the attempt whose outcome settled it.
    pub(crate) attempt: u32,
    /// Final result.
    pub(crate) result: Result<R, RetryError<E, R>>,
}

impl<R, E> Settlement<R, E> {
    fn from_outcome(
        branch: Branch,
        attempt: u32,
        outcome: AttemptOutcome<R, E>,
        attempts: u32,
    ) -> Self {
        Self {
            branch,
            attempt,
            result: outcome.into_result(attempts),
        }
    }
}

/// Runs the invocation to settlement in the mode its config selects.
pub(crate) async fn orchestrate<Q, V>(
    inv: &Invocation<'_, Q, V>,
) -> Settlement<Q::Response, Q::Error>
where
    Q: Query + ?Sized,
    V: Validate<Q::Response> + ?Sized,
{
    if inv.cfg.overlap_enabled() {
        overlap(inv).await
    } else {
        retry_loop(inv, Branch::Sequential).await
    }
}

/// Plain loop: sequential attempts bounded by the configured timeout.
///
/// Keeps spending attempts from the shared budget until one is valid or the
/// budget is exhausted after a non-valid outcome.
async fn retry_loop<Q, V>(
    inv: &Invocation<'_, Q, V>,
    branch: Branch,
) -> Settlement<Q::Response, Q::Error>
where
    Q: Query + ?Sized,
    V: Validate<Q::Response> + ?Sized,
{
    let deadline = Deadline::from_timeout(inv.cfg.attempt_timeout());

    loop {
        let (attempt, outcome) = run_attempt(inv, branch, deadline).await;

        if outcome.is_valid() || inv.budget.is_exhausted() {
            return Settlement::from_outcome(branch, attempt, outcome, inv.budget.spent());
        }
    }
}

/// Overlap mode: a kept-alive first attempt raced against delayed retries.
async fn overlap<Q, V>(inv: &Invocation<'_, Q, V>) -> Settlement<Q::Response, Q::Error>
where
    Q: Query + ?Sized,
    V: Validate<Q::Response> + ?Sized,
{
    let delay = inv.cfg.timeout;
    inv.publish(EventKind::OverlapScheduled, |ev| ev.with_delay(delay));

    let kept_alive = run_attempt(inv, Branch::KeptAlive, Deadline::none());
    let retries = async {
        time::sleep(delay).await;
        inv.publish(EventKind::OverlapStarted, |ev| {
            ev.with_branch(Branch::Overlap)
        });
        retry_loop(inv, Branch::Overlap).await
    };
    tokio::pin!(kept_alive, retries);

    tokio::select! {
        biased;

        (attempt, outcome) = &mut kept_alive => {
            if outcome.is_valid() || inv.budget.is_exhausted() {
                Settlement::from_outcome(Branch::KeptAlive, attempt, outcome, inv.budget.spent())
            } else {
                // Not settled: the overlap branch decides alone from here.
                retries.as_mut().await
            }
        }
        settlement = &mut retries => settlement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::RetryOptions, events::Bus, queries::{AttemptContext, QueryFn}};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Query whose n-th call (1-based) sleeps `plan[n-1].0` ms and fails if `plan[n-1].1`.
    fn planned(
        plan: Vec<(u64, bool)>,
        calls: Arc<AtomicU32>,
    ) -> impl crate::queries::Query<Response = u32, Error = String> {
        QueryFn::new("planned", move |_ctx: AttemptContext| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            let (delay, fail) = plan
                .get(n as usize - 1)
                .copied()
                .unwrap_or((0, true));
            async move {
                time::sleep(Duration::from_millis(delay)).await;
                if fail {
                    Err(format!("call {n} failed"))
                } else {
                    Ok(n)
                }
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_loop_retries_until_valid() {
        let calls = Arc::new(AtomicU32::new(0));
        let q = planned(vec![(10, true), (10, true), (10, false)], calls.clone());
        let v = |_: &u32| true;
        let bus = Bus::new(1);
        let cfg = RetryOptions::new().with_max_retry(5).into();
        let inv = Invocation::new(cfg, "planned", &q, &v, &bus);

        let settled = orchestrate(&inv).await;
        assert_eq!(settled.branch, Branch::Sequential);
        assert_eq!(settled.attempt, 3);
        assert_eq!(settled.result.ok(), Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_loop_reports_last_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let q = planned(vec![(300, false), (10, true)], calls.clone());
        let v = |_: &u32| true;
        let bus = Bus::new(1);
        let cfg = RetryOptions::new()
            .with_max_retry(1)
            .with_timeout_ms(200)
            .into();
        let inv = Invocation::new(cfg, "planned", &q, &v, &bus);

        let settled = orchestrate(&inv).await;
        match settled.result {
            Err(RetryError::QueryFailed { error, attempts }) => {
                assert_eq!(error, "call 2 failed");
                assert_eq!(attempts, 2);
            }
            _ => panic!("expected QueryFailed"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_kept_alive_wins_over_slower_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let q = planned(
            vec![(250, false), (200, false), (200, false)],
            calls.clone(),
        );
        let v = |_: &u32| true;
        let bus = Bus::new(1);
        let cfg = RetryOptions::new()
            .with_max_retry(2)
            .with_timeout_ms(150)
            .with_keep_first_alive(true)
            .into();
        let inv = Invocation::new(cfg, "planned", &q, &v, &bus);

        let settled = orchestrate(&inv).await;
        assert_eq!(settled.branch, Branch::KeptAlive);
        assert_eq!(settled.attempt, 1);
        assert_eq!(settled.result.ok(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_kept_alive_failure_defers_to_overlap() {
        let calls = Arc::new(AtomicU32::new(0));
        let q = planned(vec![(50, true), (20, false)], calls.clone());
        let v = |_: &u32| true;
        let bus = Bus::new(1);
        let cfg = RetryOptions::new()
            .with_max_retry(1)
            .with_timeout_ms(100)
            .with_keep_first_alive(true)
            .into();
        let inv = Invocation::new(cfg, "planned", &q, &v, &bus);

        let start = time::Instant::now();
        let settled = orchestrate(&inv).await;
        assert_eq!(settled.branch, Branch::Overlap);
        assert_eq!(settled.result.ok(), Some(2));
        // overlap still waits for the full delay before its first attempt
        assert_eq!(start.elapsed(), Duration::from_millis(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_kept_alive_failure_settles_when_budget_spent() {
        let calls = Arc::new(AtomicU32::new(0));
        // kept-alive fails at 150ms while the last overlap attempt (started at
        // 100ms, deadline at 200ms) is still in flight.
        let q = planned(vec![(150, true), (1000, false)], calls.clone());
        let v = |_: &u32| true;
        let bus = Bus::new(1);
        let cfg = RetryOptions::new()
            .with_max_retry(1)
            .with_timeout_ms(100)
            .with_keep_first_alive(true)
            .into();
        let inv = Invocation::new(cfg, "planned", &q, &v, &bus);

        let start = time::Instant::now();
        let settled = orchestrate(&inv).await;
        assert_eq!(settled.branch, Branch::KeptAlive);
        assert_eq!(settled.attempt, 1);
        match settled.result {
            Err(RetryError::QueryFailed { error, attempts }) => {
                assert_eq!(error, "call 1 failed");
                assert_eq!(attempts, 2);
            }
            _ => panic!("expected QueryFailed from the kept-alive attempt"),
        }
        assert_eq!(start.elapsed(), Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlap_timeout_settles_before_slow_kept_alive_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let q = planned(vec![(500, true), (1000, false)], calls.clone());
        let v = |_: &u32| true;
        let bus = Bus::new(1);
        let cfg = RetryOptions::new()
            .with_max_retry(1)
            .with_timeout_ms(100)
            .with_keep_first_alive(true)
            .into();
        let inv = Invocation::new(cfg, "planned", &q, &v, &bus);

        let settled = orchestrate(&inv).await;
        assert_eq!(settled.branch, Branch::Overlap);
        assert!(matches!(
            settled.result,
            Err(RetryError::TimeoutExceeded { attempts: 2, .. })
        ));
    }
}
