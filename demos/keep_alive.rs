//! # Example: keep_alive
//!
//! Demonstrates overlap mode: the first lookup is slow but never cut off by the
//! timeout, while retries start on schedule and race it for the result.
//!
//! Shows how to:
//! - Wire the built-in [`LogWriter`] into a [`Retrier`].
//! - Run a [`QueryFn`] with `keep_first_alive` enabled.
//! - Let a validator reject stale responses.
//!
//! ## Flow
//! ```text
//! t=0ms    attempt 1 (kept-alive, no deadline) ── responds at 900ms
//! t=300ms  attempt 2 (overlap, 300ms deadline) ── stale response at 350ms, rejected
//! t=350ms  attempt 3 (overlap, 300ms deadline) ── responds at 470ms, accepted
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example keep_alive --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use queryvisor::{AttemptContext, LogWriter, QueryFn, Retrier, RetryOptions, Subscribe};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Record {
    version: u32,
    served_by: u32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let retrier = Retrier::builder()
        .with_defaults(RetryOptions::new().with_timeout_ms(300))
        .with_subscribers(subs)
        .build();

    let lookup = QueryFn::new("lookup", |ctx: AttemptContext| async move {
        let (latency, version) = match ctx.attempt() {
            1 => (900, 7),
            2 => (50, 6),
            _ => (120, 7),
        };
        tokio::time::sleep(Duration::from_millis(latency)).await;
        Ok::<_, std::io::Error>(Record {
            version,
            served_by: ctx.attempt(),
        })
    });
    let fresh = |r: &Record| r.version >= 7;

    let opts = RetryOptions::new()
        .with_max_retry(3)
        .with_keep_first_alive(true);
    match retrier.run(&lookup, &fresh, opts).await {
        Ok(record) => println!(
            "got version {} from attempt {}",
            record.version, record.served_by
        ),
        Err(err) => println!("lookup failed: {}", err.as_message()),
    }

    retrier.shutdown().await;
    Ok(())
}
