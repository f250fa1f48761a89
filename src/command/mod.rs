//! # Attempt abstractions and the process-backed command.
//!
//! This module provides the attempt-related types:
//! - [`Attempt`] - trait for one async cancelable attempt
//! - [`AttemptRef`] - shared reference to an attempt (`Arc<dyn Attempt>`)
//! - [`AttemptFn`] - closure-backed implementation
//! - [`Command`] - runs an external program once per attempt

mod attempt;
mod attempt_fn;
mod process;

pub use attempt::{Attempt, AttemptRef};
pub use attempt_fn::AttemptFn;
pub use process::Command;
