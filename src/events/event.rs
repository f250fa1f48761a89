//! # Lifecycle events emitted by the retry engine.
//!
//! The [`EventKind`] enum classifies event types in two groups:
//! - **Attempt events**: one attempt's flow (starting, succeeded, failed, backoff)
//! - **Terminal events**: how the whole run ended (exhausted, cancelled)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! attempt number, the failure detail and the scheduled delay.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Events are delivered synchronously, so observers already see
//! them in attempt order; `seq` is kept for correlating log lines.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use retry::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_attempt(3)
//!     .with_error("exit status 1")
//!     .with_delay(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.error.as_deref(), Some("exit status 1"));
//! assert_eq!(ev.delay_ms, Some(5_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of engine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Attempt events ===
    /// An attempt is about to start.
    ///
    /// Sets:
    /// - `attempt`: attempt number (1-based)
    AttemptStarting,

    /// The attempt exited with status 0. Terminal for the run.
    ///
    /// Sets:
    /// - `attempt`: attempt number
    AttemptSucceeded,

    /// The attempt failed (could not start, or exited non-zero).
    ///
    /// Sets:
    /// - `attempt`: attempt number
    /// - `error`: failure detail
    /// - `exit_code`: child exit code, when it exited normally
    AttemptFailed,

    /// A failed attempt will be retried after `delay_ms`.
    ///
    /// Sets:
    /// - `attempt`: the attempt that failed
    /// - `error`: failure detail
    /// - `delay_ms`: wait before the next attempt
    BackoffScheduled,

    // === Terminal events ===
    /// The attempt budget ran out without success.
    ///
    /// Sets:
    /// - `attempt`: last attempt number
    /// - `error`: last failure detail
    Exhausted,

    /// The run was cancelled by a signal.
    ///
    /// Sets:
    /// - `attempt`: attempts started so far
    Canceled,
}

impl EventKind {
    /// Returns a short stable label (kebab-case) for log lines.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::AttemptStarting => "starting",
            EventKind::AttemptSucceeded => "succeeded",
            EventKind::AttemptFailed => "failed",
            EventKind::BackoffScheduled => "backoff",
            EventKind::Exhausted => "exhausted",
            EventKind::Canceled => "canceled",
        }
    }
}

/// Engine event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Human-readable failure detail.
    pub error: Option<Arc<str>>,
    /// Exit code of the child, if it exited normally.
    pub exit_code: Option<i32>,
    /// Backoff delay before next attempt in milliseconds (compact).
    pub delay_ms: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            attempt: None,
            error: None,
            exit_code: None,
            delay_ms: None,
        }
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a failure detail.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches the child's exit code, if any.
    #[inline]
    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u64::MAX)) as u64;
        self.delay_ms = Some(ms);
        self
    }

    /// Backoff delay as a [`Duration`], if set.
    #[inline]
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::AttemptStarting);
        let b = Event::new(EventKind::AttemptStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_delay_round_trips_through_millis() {
        let ev = Event::new(EventKind::BackoffScheduled).with_delay(Duration::from_millis(1500));
        assert_eq!(ev.delay(), Some(Duration::from_millis(1500)));
        assert_eq!(ev.attempt, None);
    }
}
