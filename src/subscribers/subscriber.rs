//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging custom observers into
//! the retry engine.
//!
//! ## Rules
//! - Events are delivered **inline**, on the engine's flow of control, between
//!   one attempt's exit and the next attempt's start.
//! - Delivery order equals publication order (attempt 1..N).
//! - Observers must not block for long and must swallow their own I/O errors;
//!   a panicking observer is isolated by [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use retry::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct FailureCounter(AtomicU32);
//!
//! impl Subscribe for FailureCounter {
//!     fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::AttemptFailed) {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

use crate::events::Event;

/// Synchronous engine observer.
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called on the engine's flow of control; keep it short.
    fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
