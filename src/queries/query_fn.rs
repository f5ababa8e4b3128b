//! # Function-backed query (`QueryFn`)
//!
//! [`QueryFn`] wraps a closure `F: Fn(AttemptContext) -> Fut`, producing a fresh
//! future per attempt. Nothing is shared between attempts unless the closure
//! captures it explicitly (e.g. an `Arc<AtomicU32>` call counter).
//!
//! ## Example
//! ```rust
//! use queryvisor::{AttemptContext, Query, QueryFn, QueryRef};
//!
//! let q: QueryRef<u32, std::io::Error> = QueryFn::arc("answer", |ctx: AttemptContext| async move {
//!     Ok::<_, std::io::Error>(40 + ctx.attempt())
//! });
//!
//! assert_eq!(q.name(), "answer");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use crate::queries::query::{AttemptContext, BoxQueryFuture, Query};

/// Function-backed query implementation.
pub struct QueryFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> QueryFn<F> {
    /// Creates a new function-backed query.
    ///
    /// Prefer [`QueryFn::arc`] when you immediately need a [`QueryRef`](crate::QueryRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the query and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut, R, E> Query for QueryFn<F>
where
    F: Fn(AttemptContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    type Response = R;
    type Error = E;

    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, ctx: AttemptContext) -> BoxQueryFuture<R, E> {
        Box::pin((self.f)(ctx))
    }
}
