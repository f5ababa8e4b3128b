#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use queryvisor::{AttemptContext, BoxQueryFuture, Query};

/// What the n-th call of a scripted query does. Responses are the call number.
#[derive(Clone, Copy, Debug)]
pub enum Step {
    /// Respond with the call number after `ms`.
    Respond(u64),
    /// Fail with `"call {n} failed"` after `ms`.
    Fail(u64),
    /// Panic immediately.
    Panic,
}

/// Query following a fixed script; calls past the end repeat the last step.
pub struct Scripted {
    steps: Arc<Vec<Step>>,
    calls: Arc<AtomicU32>,
}

impl Scripted {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(steps),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared call counter, for closures built with [`scripted_fn`].
    pub fn counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }
}

impl Query for Scripted {
    type Response = u32;
    type Error = String;

    fn name(&self) -> &str {
        "scripted"
    }

    fn spawn(&self, _ctx: AttemptContext) -> BoxQueryFuture<u32, String> {
        next_call(&self.steps, &self.calls)
    }
}

/// Closure form of [`Scripted`] for the free `run` function.
pub fn scripted_fn(
    steps: Vec<Step>,
) -> (
    impl Fn() -> BoxFuture<'static, Result<u32, String>> + Send + Sync + 'static,
    Arc<AtomicU32>,
) {
    let steps = Arc::new(steps);
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    (move || next_call(&steps, &calls), counter)
}

fn next_call(steps: &[Step], calls: &AtomicU32) -> BoxFuture<'static, Result<u32, String>> {
    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
    let step = steps
        .get(n as usize - 1)
        .or(steps.last())
        .copied()
        .unwrap_or(Step::Respond(0));

    match step {
        Step::Respond(ms) => Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(n)
        }),
        Step::Fail(ms) => Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Err(format!("call {n} failed"))
        }),
        Step::Panic => Box::pin(explode(n)),
    }
}

async fn explode(n: u32) -> Result<u32, String> {
    panic!("call {n} panicked")
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
