//! # Event subscribers for the retry engine.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for handling engine events.
//!
//! ## Architecture
//! ```text
//! Engine ── emit(Event) ──┬──► FailureReport (unless quiet) ──► stderr
//!                         │
//!                         └──► SubscriberSet ──► LogWriter ──► tracing
//!                                            └─► custom observers
//! ```
//!
//! ## Built-ins
//! - [`FailureReport`] the per-attempt failure line ("command failed at attempt #N")
//! - [`LogWriter`] structured `tracing` records for every event

mod log;
mod report;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use report::FailureReport;
pub(crate) use set::deliver;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
