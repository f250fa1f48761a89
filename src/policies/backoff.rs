//! # Backoff policy between attempts.
//!
//! [`BackoffPolicy`] controls how the wait grows after repeated failures.
//! It is parameterized by:
//! - [`BackoffPolicy::strategy`] fixed or exponential growth;
//! - [`BackoffPolicy::first`] the delay after the first failed attempt;
//! - [`BackoffPolicy::max`] the maximum delay cap.
//!
//! Under [`BackoffStrategy::Exponential`] the delay after attempt `n` (1-based) is
//! `first × 2^(n-1)`, clamped to `max`. Under [`BackoffStrategy::Fixed`] it is
//! always `first` (still clamped). Both are monotonically non-decreasing in `n`.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use retry::{BackoffPolicy, BackoffStrategy};
//!
//! let backoff = BackoffPolicy {
//!     strategy: BackoffStrategy::Exponential,
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//! };
//!
//! assert_eq!(backoff.next(1), Duration::from_millis(100));
//! assert_eq!(backoff.next(2), Duration::from_millis(200));
//!
//! // 100ms × 2^10 = 102_400ms → capped at max=10s
//! assert_eq!(backoff.next(11), Duration::from_secs(10));
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Growth factor applied per attempt under [`BackoffStrategy::Exponential`].
const EXPONENTIAL_FACTOR: f64 = 2.0;

/// How the delay evolves from one attempt to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Same delay before every retry.
    Fixed,
    /// Delay doubles after every failed attempt.
    #[default]
    Exponential,
}

impl BackoffStrategy {
    /// Returns the lowercase name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackoffStrategy::Fixed => "fixed",
            BackoffStrategy::Exponential => "exponential",
        }
    }
}

impl fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackoffStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "constant" => Ok(BackoffStrategy::Fixed),
            "exponential" | "backoff" => Ok(BackoffStrategy::Exponential),
            other => Err(format!("cannot parse {other:?} as backoff strategy")),
        }
    }
}

/// Retry backoff policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Fixed or exponential growth.
    pub strategy: BackoffStrategy,
    /// Delay after the first failed attempt.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `strategy = Exponential`;
    /// - `first = 2s`;
    /// - `max = 1h`.
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Exponential,
            first: Duration::from_secs(2),
            max: Duration::from_secs(3600),
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay to wait after failed attempt `attempt` (1-based).
    ///
    /// Attempt `0` is treated like attempt `1`. The result never exceeds
    /// [`BackoffPolicy::max`], and overflowing exponents clamp to it.
    pub fn next(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base = match self.strategy {
            BackoffStrategy::Fixed => self.first,
            BackoffStrategy::Exponential => {
                let secs = self.first.as_secs_f64() * EXPONENTIAL_FACTOR.powi(exp);
                if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
                    self.max
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        };
        base.min(self.max)
    }
}
