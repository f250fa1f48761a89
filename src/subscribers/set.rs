//! # In-order event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], which delivers each event to every subscriber
//! synchronously, in registration order.
//!
//! ## Rules
//! - **Ordered**: all subscribers see event N before any sees event N+1
//! - **Isolation**: a panicking subscriber is caught and logged; the others
//!   still receive the event and the engine keeps running
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::events::Event;
use crate::subscribers::Subscribe;

/// Ordered, panic-isolated fan-out over a list of subscribers.
#[derive(Default, Clone)]
pub struct SubscriberSet {
    subs: Vec<Arc<dyn Subscribe>>,
}

impl SubscriberSet {
    /// Creates a set from the given subscribers.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { subs }
    }

    /// Delivers `event` to every subscriber.
    pub fn emit(&self, event: &Event) {
        for sub in &self.subs {
            deliver(sub.as_ref(), event);
        }
    }
}

/// Calls one subscriber, catching and logging a panic.
pub(crate) fn deliver(sub: &dyn Subscribe, event: &Event) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| sub.on_event(event))) {
        let info = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::warn!(subscriber = sub.name(), seq = event.seq, %info, "subscriber panicked");
    }
}
