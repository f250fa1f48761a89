//! # Function-backed attempt (`AttemptFn`)
//!
//! [`AttemptFn`] wraps a closure `F: Fn(Input, CancellationToken) -> Fut`,
//! producing a fresh future per attempt. Useful for embedding the engine around
//! in-process work and for exercising the retry loop without real processes.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use retry::{AttemptError, AttemptFn, AttemptRef, Input};
//!
//! let a: AttemptRef = AttemptFn::arc("noop", |_input: Input, _ctx: CancellationToken| async {
//!     Ok::<_, AttemptError>(())
//! });
//!
//! assert_eq!(a.name(), "noop");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::command::attempt::Attempt;
use crate::error::AttemptError;
use crate::input::Input;

/// Function-backed attempt implementation.
#[derive(Debug)]
pub struct AttemptFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> AttemptFn<F> {
    /// Creates a new function-backed attempt.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the attempt and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Attempt for AttemptFn<F>
where
    F: Fn(Input, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), AttemptError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: &Input, ctx: CancellationToken) -> Result<(), AttemptError> {
        (self.f)(input.clone(), ctx).await
    }
}
