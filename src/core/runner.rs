//! # Run a single attempt.
//!
//! Executes one [`Attempt`] under a child cancellation token and turns the
//! result into an [`AttemptOutcome`], publishing the matching event.
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   attempt.run() → Ok(())          → publish AttemptSucceeded
//!
//! Failure:
//!   attempt.run() → Err(Start/Exit) → publish AttemptFailed
//!
//! Cancellation:
//!   attempt.run() → Err(Canceled)   → (nothing; the engine publishes Canceled)
//! ```
//!
//! ## Rules
//! - Derives a **child token** per attempt; cancelling the child never affects the parent
//! - The child token is cancelled once the attempt returns, so nothing the
//!   attempt spawned can outlive it

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    command::Attempt,
    error::AttemptError,
    events::{Event, EventKind},
    input::Input,
    subscribers::SubscriberSet,
};

/// Result of one attempt, kept for the final diagnostics.
#[derive(Debug)]
pub struct AttemptOutcome {
    /// Attempt number (1-based).
    pub attempt: u32,
    /// `true` iff the attempt exited with status 0.
    pub succeeded: bool,
    /// Failure detail, when not succeeded.
    pub error: Option<AttemptError>,
    /// Exit code, when the child exited normally.
    pub exit_code: Option<i32>,
}

impl AttemptOutcome {
    /// A successful attempt.
    pub fn succeeded(attempt: u32) -> Self {
        Self {
            attempt,
            succeeded: true,
            error: None,
            exit_code: Some(0),
        }
    }

    /// A failed attempt.
    pub fn failed(attempt: u32, error: AttemptError) -> Self {
        Self {
            attempt,
            succeeded: false,
            exit_code: error.exit_code(),
            error: Some(error),
        }
    }
}

/// Executes a single attempt of `attempt`, publishing its result to `subs`.
pub async fn run_once<A: Attempt + ?Sized>(
    attempt: &A,
    input: &Input,
    parent: &CancellationToken,
    number: u32,
    subs: &SubscriberSet,
) -> AttemptOutcome {
    let child = parent.child_token();
    let res = attempt.run(input, child.clone()).await;
    child.cancel();

    match res {
        Ok(()) => {
            subs.emit(&Event::new(EventKind::AttemptSucceeded).with_attempt(number));
            AttemptOutcome::succeeded(number)
        }
        Err(AttemptError::Canceled) => AttemptOutcome::failed(number, AttemptError::Canceled),
        Err(e) => {
            debug!(attempt = number, error = e.as_label(), "attempt failed");
            subs.emit(
                &Event::new(EventKind::AttemptFailed)
                    .with_attempt(number)
                    .with_exit_code(e.exit_code())
                    .with_error(e.to_string()),
            );
            AttemptOutcome::failed(number, e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::command::AttemptFn;
    use crate::error::ExitStatusText;
    use crate::subscribers::Subscribe;

    #[derive(Default)]
    struct Kinds(Mutex<Vec<EventKind>>);

    impl Subscribe for Kinds {
        fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.kind);
        }
    }

    #[tokio::test]
    async fn test_failure_is_published_and_recorded() {
        let kinds = Arc::new(Kinds::default());
        let subs = SubscriberSet::new(vec![kinds.clone() as Arc<dyn Subscribe>]);
        let attempt = AttemptFn::new("exit-2", |_input: Input, _ctx: CancellationToken| async {
            Err::<(), _>(AttemptError::Exit {
                code: Some(2),
                status: ExitStatusText::Code(2),
            })
        });

        let outcome = run_once(&attempt, &Input::Inherit, &CancellationToken::new(), 4, &subs).await;

        assert!(!outcome.succeeded);
        assert_eq!(outcome.attempt, 4);
        assert_eq!(outcome.exit_code, Some(2));
        assert_eq!(*kinds.0.lock().unwrap(), vec![EventKind::AttemptFailed]);
    }

    #[tokio::test]
    async fn test_child_token_is_isolated_from_parent() {
        let parent = CancellationToken::new();
        let attempt = AttemptFn::new("ok", |_input: Input, ctx: CancellationToken| async move {
            assert!(!ctx.is_cancelled());
            Ok::<(), AttemptError>(())
        });

        let outcome = run_once(&attempt, &Input::Inherit, &parent, 1, &SubscriberSet::default()).await;

        assert!(outcome.succeeded);
        assert!(!parent.is_cancelled());
    }
}
