//! Runtime core: orchestration of one retry invocation.
//!
//! The only public API from this module is [`Retrier`] (and its builder),
//! which turns options into a normalized config and drives the invocation.
//!
//! Internal modules:
//! - [`invocation`]: state shared by the branches of one `run`;
//! - [`budget`]: the shared, atomically advanced attempt counter;
//! - [`deadline`]: per-attempt deadline raced against the query;
//! - [`runner`]: executes one attempt and classifies its outcome;
//! - [`orchestrator`]: plain retry loop and kept-alive/overlap arbitration;
//! - [`retrier`]: public entry point and event fan-out wiring.

mod budget;
mod builder;
mod deadline;
mod invocation;
mod orchestrator;
mod retrier;
mod runner;

pub use builder::RetrierBuilder;
pub use retrier::Retrier;
