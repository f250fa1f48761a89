//! # Attempt abstraction.
//!
//! This module defines the [`Attempt`] trait: one async, cancelable execution
//! of the retried work. The common handle type is [`AttemptRef`], an
//! `Arc<dyn Attempt>` suitable for handing to the engine.
//!
//! An attempt receives the resolved [`Input`] and a [`CancellationToken`]; it
//! must stop promptly (and tear down anything it started) once the token fires.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::AttemptError;
use crate::input::Input;

/// Shared handle to an attempt implementation.
pub type AttemptRef = Arc<dyn Attempt>;

/// # Asynchronous, cancelable unit of retried work.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use retry::{Attempt, AttemptError, Input};
///
/// struct AlwaysOk;
///
/// #[async_trait]
/// impl Attempt for AlwaysOk {
///     fn name(&self) -> &str { "always-ok" }
///
///     async fn run(&self, _input: &Input, ctx: CancellationToken) -> Result<(), AttemptError> {
///         if ctx.is_cancelled() {
///             return Err(AttemptError::Canceled);
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Attempt: Send + Sync + 'static {
    /// Returns a stable, human-readable name (the program for process attempts).
    fn name(&self) -> &str;

    /// Executes one attempt until completion or cancellation.
    ///
    /// Returns `Ok(())` only on success. On cancellation implementations return
    /// [`AttemptError::Canceled`] after releasing what they started.
    async fn run(&self, input: &Input, ctx: CancellationToken) -> Result<(), AttemptError>;
}
