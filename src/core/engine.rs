//! # Engine: the retry loop.
//!
//! Drives one [`Attempt`](crate::Attempt) under a [`RetryPolicy`]:
//! - at most `max_attempts` strictly sequential attempts,
//! - a [`BackoffPolicy`](crate::BackoffPolicy) delay between them,
//! - cooperative but prompt cancellation via [`CancellationToken`],
//! - one failure report per retried attempt (unless quiet).
//!
//! ## State machine
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//! Pending ─► Running ──ok──────────────────────► Succeeded  │
//!               │                                           │
//!               ├──err, last attempt───────────► Exhausted  │
//!               │                                           │
//!               ├──err, attempts left─► report ─► sleep ────┘
//!               │                                 │
//!               └──token cancelled────────────────┴────────► Canceled
//! ```
//!
//! ## Event flow
//! ```text
//! AttemptStarting → [attempt] → AttemptSucceeded
//!                             → AttemptFailed → BackoffScheduled → [sleep] → AttemptStarting ...
//!                                             → Exhausted
//!                             → Canceled
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially**: each child has exited before the next starts
//! - No delay follows a successful attempt
//! - Observers are called inline, so report lines appear in attempt order
//! - Once the token is cancelled no new attempt starts and the run ends in `Canceled`,
//!   even if the attempt in flight exited with status 0

use std::sync::Arc;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{
    command::AttemptRef,
    core::runner::{AttemptOutcome, run_once},
    error::{AttemptError, RetryError},
    events::{Event, EventKind},
    input::Input,
    policies::RetryPolicy,
    subscribers::{FailureReport, Subscribe, SubscriberSet, deliver},
};

/// States of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// No attempt made yet.
    Pending,
    /// An attempt is running or a retry is pending.
    Running,
    /// An attempt exited with status 0.
    Succeeded,
    /// Every allowed attempt failed.
    Exhausted,
    /// Aborted by the cancellation token.
    Canceled,
}

impl State {
    /// Returns `true` for states the run cannot leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Succeeded | State::Exhausted | State::Canceled)
    }
}

/// Successful end of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completion {
    /// Number of attempts made, including the successful one.
    pub attempts: u32,
}

/// Retry loop over a single attempt implementation.
pub struct Engine {
    policy: RetryPolicy,
    attempt: AttemptRef,
    report: Arc<dyn Subscribe>,
    subs: SubscriberSet,
}

impl Engine {
    /// Starts building an engine for `attempt` under `policy`.
    pub fn builder(policy: RetryPolicy, attempt: AttemptRef) -> EngineBuilder {
        EngineBuilder::new(policy, attempt)
    }

    /// Runs attempts until success, exhaustion, or cancellation.
    ///
    /// Returns [`RetryError::Config`] without making any attempt if the policy
    /// is invalid, [`RetryError::Exhausted`] with every outcome if all attempts
    /// fail, and [`RetryError::Canceled`] once `token` fires.
    pub async fn execute(
        &self,
        input: &Input,
        token: &CancellationToken,
    ) -> Result<Completion, RetryError> {
        self.policy.validate()?;

        let mut run = Run::new(self.policy.max_attempts);
        for number in 1..=self.policy.max_attempts {
            if token.is_cancelled() {
                return Err(self.cancel(&mut run, number - 1));
            }

            run.transition(State::Running);
            self.emit(&Event::new(EventKind::AttemptStarting).with_attempt(number));
            let outcome =
                run_once(self.attempt.as_ref(), input, token, number, &self.subs).await;

            // A cancelled run never reports success, whatever the attempt returned.
            let retryable = outcome.error.as_ref().is_none_or(AttemptError::is_retryable);
            if token.is_cancelled() || !retryable {
                return Err(self.cancel(&mut run, number));
            }
            if outcome.succeeded {
                run.transition(State::Succeeded);
                return Ok(Completion { attempts: number });
            }

            let detail = outcome
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            run.outcomes.push(outcome);

            if self.policy.is_last(number) {
                run.transition(State::Exhausted);
                self.emit(
                    &Event::new(EventKind::Exhausted)
                        .with_attempt(number)
                        .with_error(detail),
                );
                return Err(RetryError::Exhausted {
                    outcomes: run.outcomes,
                });
            }

            let delay = self.policy.backoff.next(number);
            let scheduled = Event::new(EventKind::BackoffScheduled)
                .with_attempt(number)
                .with_error(detail)
                .with_delay(delay);
            if !self.policy.quiet {
                deliver(self.report.as_ref(), &scheduled);
            }
            self.emit(&scheduled);

            debug!(attempt = number, delay_ms = delay.as_millis() as u64, "retry scheduled");
            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            select! {
                biased;
                _ = token.cancelled() => {
                    return Err(self.cancel(&mut run, number));
                }
                _ = &mut sleep => {}
            }
        }

        // Only reachable with an attempt budget the validation above rejects.
        Err(RetryError::Exhausted {
            outcomes: run.outcomes,
        })
    }

    fn cancel(&self, run: &mut Run, attempts: u32) -> RetryError {
        run.transition(State::Canceled);
        self.emit(&Event::new(EventKind::Canceled).with_attempt(attempts));
        RetryError::Canceled { attempts }
    }

    fn emit(&self, event: &Event) {
        self.subs.emit(event);
    }
}

/// Mutable bookkeeping of one [`Engine::execute`] call.
struct Run {
    state: State,
    outcomes: Vec<AttemptOutcome>,
}

impl Run {
    fn new(max_attempts: u32) -> Self {
        Self {
            state: State::Pending,
            outcomes: Vec::with_capacity(max_attempts.min(64) as usize),
        }
    }

    fn transition(&mut self, next: State) {
        debug_assert!(!self.state.is_terminal(), "left terminal state {:?}", self.state);
        trace!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }
}

/// Builder for an [`Engine`].
pub struct EngineBuilder {
    policy: RetryPolicy,
    attempt: AttemptRef,
    report: Option<Arc<dyn Subscribe>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl EngineBuilder {
    /// Creates a builder; the report defaults to [`FailureReport::stderr`].
    pub fn new(policy: RetryPolicy, attempt: AttemptRef) -> Self {
        Self {
            policy,
            attempt,
            report: None,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the failure report (the sink silenced by `quiet`).
    pub fn with_report(mut self, report: Arc<dyn Subscribe>) -> Self {
        self.report = Some(report);
        self
    }

    /// Sets observers that receive every lifecycle event.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the engine.
    pub fn build(self) -> Engine {
        Engine {
            policy: self.policy,
            attempt: self.attempt,
            report: self
                .report
                .unwrap_or_else(|| Arc::new(FailureReport::stderr())),
            subs: SubscriberSet::new(self.subscribers),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::command::AttemptFn;
    use crate::error::ExitStatusText;
    use crate::policies::{BackoffPolicy, BackoffStrategy};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Kinds(Mutex<Vec<EventKind>>);

    impl Subscribe for Kinds {
        fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.kind);
        }
    }

    fn policy(max_attempts: u32, first: Duration, quiet: bool) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: BackoffPolicy {
                strategy: BackoffStrategy::Exponential,
                first,
                max: Duration::from_secs(3600),
            },
            quiet,
        }
    }

    fn exit_one() -> AttemptError {
        AttemptError::Exit {
            code: Some(1),
            status: ExitStatusText::Code(1),
        }
    }

    /// Fails until attempt `succeed_at` (never, if 0) and counts calls.
    fn flaky(calls: Arc<AtomicU32>, succeed_at: u32) -> AttemptRef {
        AttemptFn::arc("flaky", move |_input: Input, _ctx: CancellationToken| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if succeed_at != 0 && n >= succeed_at {
                    Ok(())
                } else {
                    Err(exit_one())
                }
            }
        })
    }

    fn engine(policy: RetryPolicy, attempt: AttemptRef, report: &SharedBuf) -> Engine {
        Engine::builder(policy, attempt)
            .with_report(Arc::new(FailureReport::new(report.clone())))
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_makes_exactly_n_attempts() {
        for n in 1..=5 {
            let calls = Arc::new(AtomicU32::new(0));
            let out = SharedBuf::default();
            let engine = engine(policy(n, Duration::from_millis(10), false), flaky(calls.clone(), 0), &out);

            let err = engine
                .execute(&Input::Inherit, &CancellationToken::new())
                .await
                .unwrap_err();

            assert_eq!(calls.load(Ordering::SeqCst), n);
            match err {
                RetryError::Exhausted { outcomes } => {
                    assert_eq!(outcomes.len(), n as usize);
                    let numbers: Vec<u32> = outcomes.iter().map(|o| o.attempt).collect();
                    assert_eq!(numbers, (1..=n).collect::<Vec<_>>());
                }
                other => panic!("expected exhaustion, got {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_at_k_stops_without_trailing_delay() {
        let calls = Arc::new(AtomicU32::new(0));
        let out = SharedBuf::default();
        let engine = engine(policy(5, Duration::from_millis(100), false), flaky(calls.clone(), 3), &out);

        let start = time::Instant::now();
        let done = engine
            .execute(&Input::Inherit, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(done, Completion { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 100ms after #1, 200ms after #2, nothing after #3.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(400), "{elapsed:?}");
        assert_eq!(
            out.text(),
            "command failed at attempt #1: exit status 1\n\
             command failed at attempt #2: exit status 1\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_incurs_no_delay() {
        let calls = Arc::new(AtomicU32::new(0));
        let out = SharedBuf::default();
        let engine = engine(policy(3, Duration::from_secs(2), false), flaky(calls.clone(), 1), &out);

        let start = time::Instant::now();
        let done = engine
            .execute(&Input::Inherit, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(done.attempts, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(out.text().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_attempts_wait_at_least_initial_delay() {
        let calls = Arc::new(AtomicU32::new(0));
        let out = SharedBuf::default();
        let engine = engine(policy(2, Duration::from_millis(25), false), flaky(calls.clone(), 0), &out);

        let start = time::Instant::now();
        let err = engine
            .execute(&Input::Inherit, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(start.elapsed() >= Duration::from_millis(25));
        assert!(matches!(err, RetryError::Exhausted { ref outcomes } if outcomes.len() == 2));
        // The last failure is not reported as a retry.
        assert_eq!(out.text(), "command failed at attempt #1: exit status 1\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_writes_nothing() {
        let calls = Arc::new(AtomicU32::new(0));
        let out = SharedBuf::default();
        let engine = engine(policy(4, Duration::from_millis(5), true), flaky(calls.clone(), 0), &out);

        let err = engine
            .execute(&Input::Inherit, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.as_label(), "retry_exhausted");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(out.0.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let out = SharedBuf::default();
        let engine = engine(policy(1, Duration::from_secs(60), false), flaky(calls.clone(), 0), &out);

        let start = time::Instant::now();
        let err = engine
            .execute(&Input::Inherit, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(matches!(err, RetryError::Exhausted { .. }));
        assert!(out.text().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_aborts_wait() {
        let calls = Arc::new(AtomicU32::new(0));
        let out = SharedBuf::default();
        let engine = engine(policy(5, Duration::from_secs(60), false), flaky(calls.clone(), 0), &out);
        let token = CancellationToken::new();

        let trigger = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let start = time::Instant::now();
        let err = engine.execute(&Input::Inherit, &token).await.unwrap_err();

        assert!(matches!(err, RetryError::Canceled { attempts: 1 }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_makes_no_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let out = SharedBuf::default();
        let engine = engine(policy(3, Duration::ZERO, false), flaky(calls.clone(), 1), &out);
        let token = CancellationToken::new();
        token.cancel();

        let err = engine.execute(&Input::Inherit, &token).await.unwrap_err();

        assert!(matches!(err, RetryError::Canceled { attempts: 0 }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_attempt_runs() {
        let attempt = AttemptFn::arc("hang", |_input: Input, ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), _>(AttemptError::Canceled)
        });
        let out = SharedBuf::default();
        let engine = engine(policy(3, Duration::ZERO, false), attempt, &out);
        let token = CancellationToken::new();

        let trigger = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = engine.execute(&Input::Inherit, &token).await.unwrap_err();
        assert!(matches!(err, RetryError::Canceled { attempts: 1 }));
        assert!(out.text().is_empty());
    }

    /// Cancels `token` from inside the attempt, then returns `result`.
    fn cancel_then(
        token: CancellationToken,
        result: fn() -> Result<(), AttemptError>,
    ) -> AttemptRef {
        AttemptFn::arc("racy", move |_input: Input, _ctx: CancellationToken| {
            token.cancel();
            async move { result() }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wins_over_late_success() {
        let token = CancellationToken::new();
        let out = SharedBuf::default();
        let engine = engine(
            policy(3, Duration::from_millis(10), false),
            cancel_then(token.clone(), || Ok(())),
            &out,
        );

        let res = engine.execute(&Input::Inherit, &token).await;

        assert!(matches!(res, Err(RetryError::Canceled { attempts: 1 })));
        assert!(out.text().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wins_over_late_exit_failure() {
        let token = CancellationToken::new();
        let out = SharedBuf::default();
        let engine = engine(
            policy(3, Duration::from_millis(10), false),
            cancel_then(token.clone(), || Err(exit_one())),
            &out,
        );

        let res = engine.execute(&Input::Inherit, &token).await;

        assert!(matches!(res, Err(RetryError::Canceled { attempts: 1 })));
        assert!(out.text().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_stops_the_loop() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let attempt = AttemptFn::arc("torn", move |_input: Input, _ctx: CancellationToken| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(AttemptError::Canceled) }
        });
        let out = SharedBuf::default();
        let engine = engine(policy(3, Duration::ZERO, false), attempt, &out);

        let err = engine
            .execute(&Input::Inherit, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RetryError::Canceled { attempts: 1 }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(out.text().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_rejected_before_running() {
        let calls = Arc::new(AtomicU32::new(0));
        let out = SharedBuf::default();
        let engine = engine(policy(0, Duration::ZERO, false), flaky(calls.clone(), 1), &out);

        let err = engine
            .execute(&Input::Inherit, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RetryError::Config { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_attempt_sees_same_input() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = seen.clone();
        let attempt = AttemptFn::arc("reader", move |input: Input, _ctx: CancellationToken| {
            record.lock().unwrap().push(input.bytes().map(|b| b.to_vec()));
            async { Err::<(), _>(exit_one()) }
        });
        let out = SharedBuf::default();
        let engine = engine(policy(3, Duration::from_millis(1), true), attempt, &out);
        let input = Input::from(&b"payload"[..]);

        let _ = engine.execute(&input, &CancellationToken::new()).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|b| b.as_deref() == Some(&b"payload"[..])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_follow_attempt_order() {
        let calls = Arc::new(AtomicU32::new(0));
        let kinds = Arc::new(Kinds::default());
        let engine = Engine::builder(policy(2, Duration::from_millis(1), true), flaky(calls, 2))
            .with_report(Arc::new(FailureReport::new(io::sink())))
            .with_subscribers(vec![kinds.clone() as Arc<dyn Subscribe>])
            .build();

        engine
            .execute(&Input::Inherit, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            *kinds.0.lock().unwrap(),
            vec![
                EventKind::AttemptStarting,
                EventKind::AttemptFailed,
                EventKind::BackoffScheduled,
                EventKind::AttemptStarting,
                EventKind::AttemptSucceeded,
            ]
        );
    }
}
