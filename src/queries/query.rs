//! # Query abstraction.
//!
//! This module defines the [`Query`] trait: a named producer of one fresh future
//! per attempt. The common handle type is [`QueryRef`], an `Arc<dyn Query>`
//! suitable for sharing between the branches of an invocation.
//!
//! A query receives an [`AttemptContext`] describing the attempt it serves. The
//! context's token is only ever cancelled when the invocation enables
//! `cancel_abandoned`; queries that ignore it keep the default
//! "run to completion in the background" behaviour.

use std::{future::Future, pin::Pin, sync::Arc};

use tokio_util::sync::CancellationToken;

use crate::events::Branch;

/// Boxed future returned by [`Query::spawn`].
pub type BoxQueryFuture<R, E> = Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'static>>;

/// # Shared handle to a query object.
pub type QueryRef<R, E> = Arc<dyn Query<Response = R, Error = E>>;

/// # Per-attempt context handed to a query.
#[derive(Clone, Debug)]
pub struct AttemptContext {
    attempt: u32,
    branch: Branch,
    token: CancellationToken,
}

impl AttemptContext {
    pub(crate) fn new(attempt: u32, branch: Branch, token: CancellationToken) -> Self {
        Self {
            attempt,
            branch,
            token,
        }
    }

    /// Attempt ordinal (1-based, shared by all branches of the invocation).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Branch issuing this attempt.
    pub fn branch(&self) -> Branch {
        self.branch
    }

    /// Token cancelled once the attempt's result is abandoned (opt-in).
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Convenience for `self.token().is_cancelled()`.
    pub fn is_abandoned(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// # Asynchronous query producing one response per attempt.
///
/// `spawn` is called once per attempt and must return an owned future; the
/// future runs as a detached tokio task, so it outlives the attempt if the
/// attempt times out.
///
/// # Example
/// ```
/// use queryvisor::{AttemptContext, BoxQueryFuture, Query};
///
/// struct Ping;
///
/// impl Query for Ping {
///     type Response = u16;
///     type Error = std::io::Error;
///
///     fn name(&self) -> &str { "ping" }
///
///     fn spawn(&self, ctx: AttemptContext) -> BoxQueryFuture<u16, std::io::Error> {
///         Box::pin(async move {
///             if ctx.is_abandoned() {
///                 return Err(std::io::Error::other("abandoned"));
///             }
///             Ok(200)
///         })
///     }
/// }
/// ```
pub trait Query: Send + Sync + 'static {
    /// Response produced by a successful attempt.
    type Response: Send + 'static;
    /// Error produced by a failed attempt.
    type Error: Send + 'static;

    /// Returns a stable, human-readable query name.
    fn name(&self) -> &str;

    /// Creates the future for one attempt.
    fn spawn(&self, ctx: AttemptContext) -> BoxQueryFuture<Self::Response, Self::Error>;
}
