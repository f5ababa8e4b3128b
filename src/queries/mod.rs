//! # Query abstractions.
//!
//! This module provides the caller-supplied collaborators of an invocation:
//! - [`Query`] - trait for producing one attempt future at a time
//! - [`QueryFn`] - function-backed query implementation
//! - [`QueryRef`] - shared reference to a query (`Arc<dyn Query>`)
//! - [`AttemptContext`] - attempt ordinal, branch and cancellation token
//! - [`Validate`] - response predicate, implemented by plain closures

mod query;
mod query_fn;
mod validator;

pub use query::{AttemptContext, BoxQueryFuture, Query, QueryRef};
pub use query_fn::QueryFn;
pub use validator::{accept_all, AcceptAll, Validate};
