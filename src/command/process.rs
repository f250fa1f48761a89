//! # Process-backed attempt.
//!
//! [`Command`] runs the target program as a child process, once per attempt.
//!
//! ## Wiring
//! ```text
//! stdin  ◄── Input::Captured → fresh pipe, bytes written from offset 0, then closed
//!        ◄── Input::Inherit  → parent's terminal
//! stdout ──► parent's stdout (inherited, no buffering)
//! stderr ──► parent's stderr (inherited, no buffering)
//! ```
//!
//! ## Rules
//! - Arguments are handed to the OS verbatim; no shell is involved.
//! - The child is waited on under the attempt's token; on cancellation it is
//!   killed and reaped before [`AttemptError::Canceled`] is returned.
//! - Spawn failures become [`AttemptError::Start`], non-zero exits
//!   [`AttemptError::Exit`].

use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::command::attempt::Attempt;
use crate::error::{AttemptError, ExitStatusText, RetryError};
use crate::input::Input;

/// Target program and its argument vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    program: String,
    args: Vec<String>,
}

impl Command {
    /// Creates a command from a program and its arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits an argv (`program arg...`) into a command.
    ///
    /// Fails with a configuration error when `argv` is empty or the program is blank.
    pub fn from_argv(argv: Vec<String>) -> Result<Self, RetryError> {
        let mut argv = argv.into_iter();
        match argv.next() {
            Some(program) if !program.trim().is_empty() => Ok(Self::new(program, argv)),
            Some(_) => Err(RetryError::config("command name must not be empty")),
            None => Err(RetryError::config("no command specified")),
        }
    }

    /// Program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments, excluding the program.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl Attempt for Command {
    fn name(&self) -> &str {
        &self.program
    }

    async fn run(&self, input: &Input, ctx: CancellationToken) -> Result<(), AttemptError> {
        if ctx.is_cancelled() {
            return Err(AttemptError::Canceled);
        }

        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(input.stdio())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AttemptError::Start {
                program: self.program.clone(),
                source,
            })?;
        debug!(program = %self.program, pid = ?child.id(), "child started");

        let feeder = match (input.bytes(), child.stdin.take()) {
            (Some(bytes), Some(stdin)) => Some(feed(stdin, Arc::clone(bytes))),
            _ => None,
        };

        let waited = tokio::select! {
            biased;
            _ = ctx.cancelled() => None,
            status = child.wait() => Some(status),
        };
        if let Some(feeder) = feeder {
            feeder.abort();
        }

        let Some(status) = waited else {
            debug!(program = %self.program, pid = ?child.id(), "cancelled, killing child");
            if let Err(err) = child.kill().await {
                warn!(program = %self.program, error = %err, "failed to kill child");
            }
            return Err(AttemptError::Canceled);
        };

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(exit_error(status)),
            Err(err) => {
                warn!(program = %self.program, error = %err, "failed to wait for child");
                Err(AttemptError::Exit {
                    code: None,
                    status: ExitStatusText::Unknown,
                })
            }
        }
    }
}

/// Writes the captured bytes into the child's stdin, then closes it.
fn feed(mut stdin: ChildStdin, bytes: Arc<[u8]>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = stdin.write_all(&bytes).await {
            // The child may exit without reading all of its input.
            if err.kind() != ErrorKind::BrokenPipe {
                debug!(error = %err, "failed to write captured stdin");
            }
        }
        let _ = stdin.shutdown().await;
    })
}

fn exit_error(status: ExitStatus) -> AttemptError {
    let code = status.code();
    let text = match code {
        Some(code) => ExitStatusText::Code(code),
        None => signal_text(status),
    };
    AttemptError::Exit { code, status: text }
}

#[cfg(unix)]
fn signal_text(status: ExitStatus) -> ExitStatusText {
    use std::os::unix::process::ExitStatusExt;

    status
        .signal()
        .map_or(ExitStatusText::Unknown, ExitStatusText::Signal)
}

#[cfg(not(unix))]
fn signal_text(_status: ExitStatus) -> ExitStatusText {
    ExitStatusText::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_argv_splits_program() {
        let cmd = Command::from_argv(vec!["ls".into(), "-la".into(), "--".into()]).unwrap();
        assert_eq!(cmd.program(), "ls");
        assert_eq!(cmd.args(), ["-la", "--"]);
    }

    #[test]
    fn test_from_argv_rejects_empty() {
        let err = Command::from_argv(Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "no command specified");
        assert!(Command::from_argv(vec![" ".into()]).is_err());
    }

    #[cfg(unix)]
    mod unix {
        use std::time::{Duration, Instant};

        use super::*;

        #[tokio::test]
        async fn test_zero_exit_succeeds() {
            let cmd = Command::new("true", Vec::<String>::new());
            let res = cmd.run(&Input::Inherit, CancellationToken::new()).await;
            assert!(res.is_ok());
        }

        #[tokio::test]
        async fn test_non_zero_exit_reports_code() {
            let cmd = Command::new("sh", ["-c", "exit 3"]);
            let err = cmd
                .run(&Input::Inherit, CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(err.exit_code(), Some(3));
            assert_eq!(err.to_string(), "exit status 3");
        }

        #[tokio::test]
        async fn test_missing_binary_is_start_error() {
            let cmd = Command::new("definitely-not-a-real-binary-4711", Vec::<String>::new());
            let err = cmd
                .run(&Input::Inherit, CancellationToken::new())
                .await
                .unwrap_err();
            assert!(matches!(err, AttemptError::Start { .. }));
            assert!(err.is_retryable());
        }

        #[tokio::test]
        async fn test_captured_input_is_replayed_from_start() {
            let input = Input::from(&b"hello"[..]);
            let cmd = Command::new("sh", ["-c", r#"test "$(cat)" = hello"#]);

            for _ in 0..3 {
                cmd.run(&input, CancellationToken::new()).await.unwrap();
            }
        }

        #[tokio::test]
        async fn test_child_ignoring_input_still_succeeds() {
            let big = vec![b'x'; 1 << 20];
            let input = Input::from(&big[..]);
            let cmd = Command::new("true", Vec::<String>::new());
            assert!(cmd.run(&input, CancellationToken::new()).await.is_ok());
        }

        #[tokio::test]
        async fn test_cancellation_kills_running_child() {
            let token = CancellationToken::new();
            let cmd = Command::new("sleep", ["30"]);

            let trigger = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                trigger.cancel();
            });

            let start = Instant::now();
            let err = cmd.run(&Input::Inherit, token).await.unwrap_err();
            assert!(matches!(err, AttemptError::Canceled));
            assert!(start.elapsed() < Duration::from_secs(10));
        }

        #[tokio::test]
        async fn test_already_cancelled_does_not_spawn() {
            let token = CancellationToken::new();
            token.cancel();
            let cmd = Command::new("definitely-not-a-real-binary-4711", Vec::<String>::new());
            let err = cmd.run(&Input::Inherit, token).await.unwrap_err();
            assert!(matches!(err, AttemptError::Canceled));
        }
    }
}
