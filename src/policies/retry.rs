//! # Retry policy for one run.
//!
//! [`RetryPolicy`] is the immutable bundle the engine runs under: the attempt
//! budget, the [`BackoffPolicy`] between attempts, and whether per-attempt
//! failures are reported.

use crate::error::RetryError;
use crate::policies::backoff::BackoffPolicy;

/// Default attempt budget.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Policy governing one retry run.
///
/// Constructed once by the configuration layer and never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (`>= 1`).
    pub max_attempts: u32,
    /// Delay between attempts.
    pub backoff: BackoffPolicy,
    /// Suppresses the per-attempt failure report.
    pub quiet: bool,
}

impl Default for RetryPolicy {
    /// Returns `max_attempts = 3`, default backoff, `quiet = false`.
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_ATTEMPTS,
            backoff: BackoffPolicy::default(),
            quiet: false,
        }
    }
}

impl RetryPolicy {
    /// Rejects values the engine cannot run under.
    pub fn validate(&self) -> Result<(), RetryError> {
        if self.max_attempts == 0 {
            return Err(RetryError::config("number of attempts must be at least 1"));
        }
        Ok(())
    }

    /// Returns `true` if attempt `attempt` (1-based) is the last one allowed.
    #[inline]
    pub fn is_last(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}
