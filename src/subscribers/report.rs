//! # FailureReport: one line per retried failure
//!
//! The user-facing report written between attempts:
//!
//! ```text
//! command failed at attempt #1: exit status 1
//! command failed at attempt #2: exit status 1
//! ```
//!
//! Only [`EventKind::BackoffScheduled`] produces output, so a line appears
//! exactly when a failed attempt is going to be retried. Write errors are
//! swallowed; reporting never aborts the run.

use std::io::{self, Write};
use std::sync::Mutex;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Writes a failure line for every scheduled retry.
pub struct FailureReport {
    out: Mutex<Box<dyn Write + Send>>,
}

impl FailureReport {
    /// Reports to the given writer.
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    /// Reports to the process's standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl Subscribe for FailureReport {
    fn on_event(&self, e: &Event) {
        if e.kind != EventKind::BackoffScheduled {
            return;
        }
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        let attempt = e.attempt.unwrap_or_default();
        let detail = e.error.as_deref().unwrap_or("unknown error");
        let _ = writeln!(out, "command failed at attempt #{attempt}: {detail}");
        let _ = out.flush();
    }

    fn name(&self) -> &'static str {
        "FailureReport"
    }
}
