//! # Standard input capture for replay across attempts.
//!
//! A pipe can only be consumed once, so when standard input is not a terminal
//! it is read to the end **once**, before the first attempt, and every attempt
//! then gets a fresh view over the same bytes starting at offset 0.
//!
//! ```text
//! stdin is a TTY ──► Input::Inherit          (child inherits the live handle)
//! stdin is piped ──► Input::Captured(bytes)  (replayed to every attempt)
//! ```
//!
//! The captured buffer is an `Arc<[u8]>`: attempts share it without copying.

use std::io::IsTerminal;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::RetryError;

/// Resolved input source for every attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// Interactive terminal: the child reads the live handle directly.
    Inherit,
    /// Non-interactive stdin, fully buffered (possibly empty).
    Captured(Arc<[u8]>),
}

impl Input {
    /// Captures the process's standard input.
    ///
    /// Returns [`Input::Inherit`] for a terminal; otherwise reads stdin to
    /// end-of-stream. A read failure is fatal ([`RetryError::InputRead`]).
    pub async fn from_stdin() -> Result<Self, RetryError> {
        let interactive = std::io::stdin().is_terminal();
        Self::capture(tokio::io::stdin(), interactive).await
    }

    /// Captures `reader` unless `interactive` is set.
    pub async fn capture<R>(mut reader: R, interactive: bool) -> Result<Self, RetryError>
    where
        R: AsyncRead + Unpin,
    {
        if interactive {
            tracing::debug!("stdin is a terminal, passing it through");
            return Ok(Input::Inherit);
        }

        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .map_err(|source| RetryError::InputRead { source })?;
        tracing::debug!(bytes = buf.len(), "captured stdin for replay");
        Ok(Input::Captured(buf.into()))
    }

    /// Captured bytes, or `None` for a pass-through terminal.
    pub fn bytes(&self) -> Option<&Arc<[u8]>> {
        match self {
            Input::Inherit => None,
            Input::Captured(bytes) => Some(bytes),
        }
    }

    /// How the child's stdin must be wired for this input.
    pub(crate) fn stdio(&self) -> Stdio {
        match self {
            Input::Inherit => Stdio::inherit(),
            Input::Captured(_) => Stdio::piped(),
        }
    }
}

impl From<&[u8]> for Input {
    fn from(bytes: &[u8]) -> Self {
        Input::Captured(bytes.into())
    }
}
