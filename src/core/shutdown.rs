//! # Cancellation source.
//!
//! [`spawn_signal_listener`] starts the single background task that turns the
//! first termination signal into `token.cancel()`. The engine, the runner and
//! every running child observe that token.
//!
//! Signals watched on Unix: `SIGINT`, `SIGTERM`, `SIGQUIT`.
//! Elsewhere only Ctrl-C ([`tokio::signal::ctrl_c`]) is available.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Resolves with the name of the first termination signal received.
///
/// Listeners are registered on each call. Fails only if registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
        _ = quit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Resolves with `"ctrl-c"` once Ctrl-C is pressed.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}

/// Spawns the listener that cancels `token` on the first signal.
///
/// The task also ends once `token` is cancelled by anyone else.
pub fn spawn_signal_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            res = wait_for_shutdown_signal() => match res {
                Ok(signal) => {
                    tracing::warn!(signal, "termination signal received, cancelling");
                    token.cancel();
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to install signal handlers");
                }
            },
            _ = token.cancelled() => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_listener_exits_when_token_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let handle = spawn_signal_listener(token.clone());

        token.cancel();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("listener should exit")
            .expect("listener should not panic");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_cancels_token() {
        let token = CancellationToken::new();
        let handle = spawn_signal_listener(token.clone());
        // Let the listener register its handlers before signalling.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .expect("kill should run");
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), token.cancelled())
            .await
            .expect("token should be cancelled");
        handle.await.expect("listener should not panic");
    }
}
