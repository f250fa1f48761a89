//! Retry and backoff policies.
//!
//! This module groups the knobs that control **how many** attempts are made
//! and **how long** to wait between them.
//!
//! ## Contents
//! - [`RetryPolicy`]     attempt budget, backoff, quiet flag
//! - [`BackoffPolicy`]   how delays evolve (strategy / first / max)
//! - [`BackoffStrategy`] fixed or exponential growth
//!
//! ## Quick wiring
//! ```text
//! Config { policy: RetryPolicy, command }
//!      └─► core::engine::Engine uses:
//!           - policy.max_attempts to decide continue/exhaust
//!           - policy.backoff.next(attempt) to schedule the next attempt
//!           - policy.quiet to gate the failure report
//! ```
//!
//! ## Defaults
//! - `max_attempts = 3`, `quiet = false`.
//! - `BackoffPolicy::default()` → first=2s, exponential, max=1h.

mod backoff;
mod retry;

pub use backoff::{BackoffPolicy, BackoffStrategy};
pub use retry::{DEFAULT_ATTEMPTS, RetryPolicy};
