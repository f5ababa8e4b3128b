//! # Built-in subscribers
//!
//! - [`LogWriter`]: renders events through `tracing` (feature `logging`).

mod log;

pub use log::LogWriter;
