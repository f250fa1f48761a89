//! # LogWriter: forwards events to `tracing`
//!
//! A subscriber that turns every [`Event`] into a structured `tracing` record.
//! Nothing is printed unless the binary's filter (`RETRY_LOG`) enables it.
//!
//! ## Example output (`RETRY_LOG=debug`)
//! ```text
//! DEBUG retry::subscribers::log: starting seq=0 attempt=1
//! DEBUG retry::subscribers::log: failed seq=1 attempt=1 exit_code=1 err="exit status 1"
//! DEBUG retry::subscribers::log: backoff seq=2 attempt=1 delay_ms=2000 err="exit status 1"
//! WARN  retry::subscribers::log: exhausted seq=5 attempt=2 err="exit status 1"
//! ```

use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Subscribe for LogWriter {
    fn on_event(&self, e: &Event) {
        let label = e.kind.as_label();
        match e.kind {
            EventKind::AttemptStarting => {
                debug!(seq = e.seq, attempt = ?e.attempt, "{label}");
            }
            EventKind::AttemptSucceeded => {
                info!(seq = e.seq, attempt = ?e.attempt, "{label}");
            }
            EventKind::AttemptFailed => {
                debug!(
                    seq = e.seq,
                    attempt = ?e.attempt,
                    exit_code = ?e.exit_code,
                    err = ?e.error,
                    "{label}"
                );
            }
            EventKind::BackoffScheduled => {
                debug!(
                    seq = e.seq,
                    attempt = ?e.attempt,
                    delay_ms = ?e.delay_ms,
                    err = ?e.error,
                    "{label}"
                );
            }
            EventKind::Exhausted => {
                warn!(seq = e.seq, attempt = ?e.attempt, err = ?e.error, "{label}");
            }
            EventKind::Canceled => {
                warn!(seq = e.seq, attempt = ?e.attempt, "{label}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
