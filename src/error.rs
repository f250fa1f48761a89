//! Error types used by the retry engine and individual attempts.
//!
//! This module defines two main error enums:
//!
//! - [`RetryError`]: errors that end a whole run (bad configuration, unreadable
//!   stdin, exhaustion, cancellation).
//! - [`AttemptError`]: errors raised by a single attempt of the target command.
//!
//! Both types provide `as_label` for logs, plus [`AttemptError::is_retryable`]
//! (drives the retry loop) and [`RetryError::exit_code`] (drives the process
//! exit status).

use std::fmt;

use thiserror::Error;

use crate::core::AttemptOutcome;

/// # Errors produced by a single attempt.
///
/// `Start` and `Exit` are ordinary attempt failures and are retried alike;
/// `Canceled` means the attempt was torn down by the cancellation token.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AttemptError {
    /// The target program could not be launched (missing binary, permission denied).
    #[error("failed to start {program:?}: {source}")]
    Start {
        /// Program name as given on the command line.
        program: String,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The target program ran and exited unsuccessfully.
    #[error("{status}")]
    Exit {
        /// Exit code, if the child exited normally.
        code: Option<i32>,
        /// Rendered exit status, e.g. `exit status 1` or `signal: 9`.
        status: ExitStatusText,
    },

    /// The attempt was aborted because the run was cancelled.
    #[error("context cancelled")]
    Canceled,
}

impl AttemptError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use retry::AttemptError;
    ///
    /// assert_eq!(AttemptError::Canceled.as_label(), "attempt_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AttemptError::Start { .. } => "attempt_start_failed",
            AttemptError::Exit { .. } => "attempt_exit_failed",
            AttemptError::Canceled => "attempt_canceled",
        }
    }

    /// Indicates whether another attempt may follow this failure.
    ///
    /// Returns `true` for [`AttemptError::Start`] and [`AttemptError::Exit`].
    ///
    /// # Example
    /// ```
    /// use retry::AttemptError;
    ///
    /// assert!(!AttemptError::Canceled.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, AttemptError::Start { .. } | AttemptError::Exit { .. })
    }

    /// Exit code of the child, when it ran and exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            AttemptError::Exit { code, .. } => *code,
            _ => None,
        }
    }
}

/// Rendered form of a non-successful exit status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExitStatusText {
    /// Normal exit with a non-zero code.
    Code(i32),
    /// Terminated by a signal (Unix only).
    Signal(i32),
    /// Platform reported neither a code nor a signal.
    Unknown,
}

impl fmt::Display for ExitStatusText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatusText::Code(code) => write!(f, "exit status {code}"),
            ExitStatusText::Signal(sig) => write!(f, "signal: {sig}"),
            ExitStatusText::Unknown => f.write_str("exit status unknown"),
        }
    }
}

/// # Errors that end a run.
///
/// Configuration and input errors abort before the first attempt; the other
/// variants are terminal states of the retry loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RetryError {
    /// Invalid configuration supplied by the CLI layer.
    #[error("{reason}")]
    Config {
        /// What was wrong.
        reason: String,
    },

    /// Standard input could not be captured.
    #[error("failed to read standard input: {source}")]
    InputRead {
        /// The underlying read error.
        #[source]
        source: std::io::Error,
    },

    /// Every attempt failed.
    #[error("{}", AllAttempts(.outcomes))]
    Exhausted {
        /// Outcome of every attempt, in order.
        outcomes: Vec<AttemptOutcome>,
    },

    /// The run was cancelled by a signal.
    #[error("cancelled after {attempts} attempt(s)")]
    Canceled {
        /// Number of attempts started before cancellation.
        attempts: u32,
    },
}

impl RetryError {
    /// Shorthand for [`RetryError::Config`].
    pub fn config(reason: impl Into<String>) -> Self {
        RetryError::Config {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use retry::RetryError;
    ///
    /// let err = RetryError::Canceled { attempts: 2 };
    /// assert_eq!(err.as_label(), "retry_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RetryError::Config { .. } => "retry_config",
            RetryError::InputRead { .. } => "retry_input_read",
            RetryError::Exhausted { .. } => "retry_exhausted",
            RetryError::Canceled { .. } => "retry_canceled",
        }
    }

    /// Process exit code for this failure. Never `0`.
    pub fn exit_code(&self) -> u8 {
        match self {
            RetryError::Canceled { .. } => 130,
            _ => 1,
        }
    }
}

/// Renders the aggregate of failed attempts, one `#n: error` line each.
struct AllAttempts<'a>(&'a [AttemptOutcome]);

impl fmt::Display for AllAttempts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("All attempts fail:")?;
        for outcome in self.0 {
            match &outcome.error {
                Some(err) => write!(f, "\n#{}: {}", outcome.attempt, err)?,
                None => write!(f, "\n#{}: ok", outcome.attempt)?,
            }
        }
        Ok(())
    }
}
