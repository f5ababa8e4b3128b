mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{ms, scripted_fn, Scripted, Step};
use queryvisor::{accept_all, AttemptContext, QueryFn, Retrier, RetryError, RetryOptions};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_first_valid_response_is_returned() {
    let (query, calls) = scripted_fn(vec![Step::Respond(10)]);

    let res = queryvisor::run(query, accept_all(), RetryOptions::new().with_max_retry(3)).await;

    assert_eq!(res.ok(), Some(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_errors_then_success() {
    let (query, calls) = scripted_fn(vec![Step::Fail(5), Step::Fail(5), Step::Respond(5)]);

    let res = queryvisor::run(query, accept_all(), RetryOptions::new().with_max_retry(3)).await;

    assert_eq!(res.ok(), Some(3));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_timeouts_then_success() {
    let q = Scripted::new(vec![
        Step::Respond(300),
        Step::Respond(300),
        Step::Respond(10),
    ]);
    let opts = RetryOptions::new().with_max_retry(2).with_timeout_ms(100);

    let start = Instant::now();
    let res = Retrier::new().run(&q, &accept_all(), opts).await;

    assert_eq!(res.ok(), Some(3));
    assert_eq!(q.calls(), 3);
    assert_eq!(start.elapsed(), ms(210));
}

#[tokio::test(start_paused = true)]
async fn test_validator_accepting_only_nth_response() {
    let q = Scripted::new(vec![Step::Respond(1)]);
    let opts = RetryOptions::new().with_max_retry(5);

    let res = Retrier::new().run(&q, &|n: &u32| *n == 4, opts).await;

    assert_eq!(res.ok(), Some(4));
    assert_eq!(q.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_rejections_exhaust_with_last_response() {
    let q = Scripted::new(vec![Step::Respond(1)]);
    let opts = RetryOptions::new().with_max_retry(2);

    let err = Retrier::new()
        .run(&q, &|_: &u32| false, opts)
        .await
        .expect_err("every response is rejected");

    assert_eq!(err.as_label(), "retry_validation_exhausted");
    assert_eq!(err.attempts(), 3);
    assert_eq!(err.into_response(), Some(3));
    assert_eq!(q.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failures_exhaust_with_last_error() {
    let q = Scripted::new(vec![Step::Fail(1)]);
    let opts = RetryOptions::new().with_max_retry(2);

    let err = Retrier::new()
        .run(&q, &accept_all(), opts)
        .await
        .expect_err("every call fails");

    match err {
        RetryError::QueryFailed { error, attempts } => {
            assert_eq!(error, "call 3 failed");
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(q.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_last_attempt_decides_error_kind() {
    // rejected, failed, then timed out
    let q = Scripted::new(vec![Step::Respond(1), Step::Fail(1), Step::Respond(500)]);
    let opts = RetryOptions::new().with_max_retry(2).with_timeout_ms(100);

    let err = Retrier::new()
        .run(&q, &|_: &u32| false, opts)
        .await
        .expect_err("nothing is accepted");

    assert!(err.is_timeout());
    assert_eq!(err.attempts(), 3);
    assert_eq!(
        err.to_string(),
        "timeout reached after 3 attempt(s) (100ms per attempt)"
    );
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_times_out() {
    let q = Scripted::new(vec![Step::Respond(300)]);
    let opts = RetryOptions::new().with_max_retry(0).with_timeout_ms(200);

    let start = Instant::now();
    let err = Retrier::new()
        .run(&q, &accept_all(), opts)
        .await
        .expect_err("query is slower than the timeout");

    match err {
        RetryError::TimeoutExceeded { timeout, attempts } => {
            assert_eq!(timeout, ms(200));
            assert_eq!(attempts, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(q.calls(), 1);
    assert_eq!(start.elapsed(), ms(200));
}

#[tokio::test(start_paused = true)]
async fn test_negative_options_mean_single_attempt_without_timeout() {
    let q = Scripted::new(vec![Step::Fail(1)]);
    let opts = RetryOptions::new().with_max_retry(-4).with_timeout_ms(-1);

    let err = Retrier::new()
        .run(&q, &accept_all(), opts)
        .await
        .expect_err("fails");
    assert_eq!(err.attempts(), 1);
    assert_eq!(q.calls(), 1);

    let slow = Scripted::new(vec![Step::Respond(60_000)]);
    let res = Retrier::new().run(&slow, &accept_all(), opts).await;
    assert_eq!(res.ok(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_missing_options_mean_single_attempt_without_timeout() {
    let q = Scripted::new(vec![Step::Respond(10_000), Step::Respond(1)]);

    let start = Instant::now();
    let err = Retrier::new()
        .run(&q, &|n: &u32| *n == 2, RetryOptions::default())
        .await
        .expect_err("only one attempt is made");

    assert_eq!(err.response(), Some(&1));
    assert_eq!(q.calls(), 1);
    assert_eq!(start.elapsed(), ms(10_000));
}

#[tokio::test(start_paused = true)]
async fn test_panicking_attempt_is_retried() {
    let q = Scripted::new(vec![Step::Panic, Step::Respond(1)]);

    let res = Retrier::new()
        .run(&q, &accept_all(), RetryOptions::new().with_max_retry(1))
        .await;

    assert_eq!(res.ok(), Some(2));
    assert_eq!(q.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_panic_on_final_attempt_is_reported() {
    let q = Scripted::new(vec![Step::Panic]);

    let err = Retrier::new()
        .run(&q, &accept_all(), RetryOptions::new())
        .await
        .expect_err("query panics");

    match err {
        RetryError::QueryPanicked { reason, attempts } => {
            assert_eq!(reason, "call 1 panicked");
            assert_eq!(attempts, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_retrier_defaults_are_merged_under_call_options() {
    let retrier = Retrier::builder()
        .with_defaults(RetryOptions::new().with_max_retry(2).with_timeout_ms(50))
        .build();

    let q = Scripted::new(vec![Step::Fail(1)]);
    let err = retrier
        .run(&q, &accept_all(), RetryOptions::new())
        .await
        .expect_err("fails");
    assert_eq!(err.attempts(), 3);
    assert_eq!(q.calls(), 3);

    let q = Scripted::new(vec![Step::Fail(1)]);
    let err = retrier
        .run(&q, &accept_all(), RetryOptions::new().with_max_retry(0))
        .await
        .expect_err("fails");
    assert_eq!(err.attempts(), 1);
    assert_eq!(q.calls(), 1);

    // the default timeout still applies
    let q = Scripted::new(vec![Step::Respond(80)]);
    let err = retrier
        .run(&q, &accept_all(), RetryOptions::new().with_max_retry(0))
        .await
        .expect_err("times out");
    assert!(err.is_timeout());
}

#[tokio::test(start_paused = true)]
async fn test_run_fn_counts_invocations() {
    let (query, calls) = scripted_fn(vec![Step::Fail(1), Step::Respond(1)]);
    let opts = RetryOptions::new().with_max_retry(4);

    let res = Retrier::new()
        .run_fn("counted", query, &accept_all(), opts)
        .await;

    assert_eq!(res.ok(), Some(2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_query_keeps_running() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);

    let query = QueryFn::new("background", move |_ctx: AttemptContext| {
        let flag = Arc::clone(&flag);
        async move {
            tokio::time::sleep(ms(300)).await;
            flag.store(true, Ordering::SeqCst);
            Ok::<u32, String>(1)
        }
    });

    let opts = RetryOptions::new().with_timeout_ms(100);
    let err = Retrier::new()
        .run(&query, &accept_all(), opts)
        .await
        .expect_err("times out");
    assert!(err.is_timeout());
    assert!(!finished.load(Ordering::SeqCst));

    tokio::time::sleep(ms(250)).await;
    assert!(finished.load(Ordering::SeqCst));
}
