//! Runtime core: the retry loop and its collaborators.
//!
//! The public API from this module is [`Engine`] (with [`EngineBuilder`]),
//! which drives attempts under a [`RetryPolicy`](crate::RetryPolicy), plus
//! the cancellation source [`spawn_signal_listener`].
//!
//! Internal modules:
//! - [`runner`]: executes one attempt under a child token and publishes its result;
//! - [`engine`]: the attempt loop state machine with backoff and cancellation;
//! - [`shutdown`]: cross-platform signal handling feeding the cancellation token.

mod engine;
mod runner;
mod shutdown;

pub use engine::{Completion, Engine, EngineBuilder, State};
pub use runner::{AttemptOutcome, run_once};
pub use shutdown::{spawn_signal_listener, wait_for_shutdown_signal};
