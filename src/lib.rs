//! # retry
//!
//! **retry** re-executes an external command until it succeeds or a bounded
//! number of attempts is exhausted, waiting a (fixed or exponential) backoff
//! delay between attempts.
//!
//! ## Architecture
//! ```text
//!   CLI / env ──► Config { RetryPolicy, Command }
//!                      │
//!   stdin ──► Input::from_stdin()  (captured once if piped)
//!                      │
//!   signals ──► spawn_signal_listener ──► CancellationToken
//!                      │                        │
//!                      ▼                        ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Engine (retry loop)                                          │
//! │  loop {                                                       │
//! │    ├─► publish AttemptStarting                                │
//! │    ├─► run_once(command, input, child_token)                  │
//! │    │      ├─ Ok  ──► AttemptSucceeded, return                 │
//! │    │      └─ Err ──► AttemptFailed                            │
//! │    ├─► last attempt? ──► Exhausted, return aggregate error    │
//! │    ├─► BackoffScheduled ──► FailureReport (unless quiet)      │
//! │    └─► sleep(backoff.next(n)) or cancelled ──► Canceled       │
//! │  }                                                            │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//! | Area         | Description                                          | Key types / traits                          |
//! |--------------|------------------------------------------------------|---------------------------------------------|
//! | **Engine**   | Sequential attempt loop with backoff/cancellation.   | [`Engine`], [`EngineBuilder`], [`State`]    |
//! | **Policies** | Attempt budget and delay growth.                     | [`RetryPolicy`], [`BackoffPolicy`]          |
//! | **Attempts** | Process-backed or closure-backed attempts.           | [`Attempt`], [`Command`], [`AttemptFn`]     |
//! | **Input**    | Capture piped stdin once, replay it every attempt.   | [`Input`]                                   |
//! | **Events**   | Ordered lifecycle events and observers.              | [`Event`], [`Subscribe`], [`FailureReport`] |
//! | **Errors**   | Typed errors for runs and attempts.                  | [`RetryError`], [`AttemptError`]            |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use retry::{Command, Engine, Input, RetryPolicy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let command = Command::new("curl", ["-fsS", "https://example.com"]);
//!     let engine = Engine::builder(RetryPolicy::default(), Arc::new(command)).build();
//!
//!     let token = CancellationToken::new();
//!     retry::spawn_signal_listener(token.clone());
//!
//!     let input = Input::from_stdin().await?;
//!     let done = engine.execute(&input, &token).await?;
//!     println!("succeeded after {} attempt(s)", done.attempts);
//!     Ok(())
//! }
//! ```
mod command;
mod config;
mod core;
mod error;
mod events;
mod input;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use command::{Attempt, AttemptFn, AttemptRef, Command};
pub use config::{
    Config, ENV_ATTEMPTS, ENV_BACKOFF, ENV_DELAY, ENV_LOG, ENV_MAX_DELAY, ENV_QUIET,
    parse_attempts, parse_bool, parse_duration,
};
pub use crate::core::{
    AttemptOutcome, Completion, Engine, EngineBuilder, State, run_once, spawn_signal_listener,
    wait_for_shutdown_signal,
};
pub use error::{AttemptError, ExitStatusText, RetryError};
pub use events::{Event, EventKind};
pub use input::Input;
pub use policies::{BackoffPolicy, BackoffStrategy, DEFAULT_ATTEMPTS, RetryPolicy};
pub use subscribers::{FailureReport, LogWriter, Subscribe, SubscriberSet};
