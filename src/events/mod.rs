//! Engine events: attempt lifecycle data model.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//!
//! ## Quick reference
//! - **Publisher**: `core::engine::Engine`, once per state transition.
//! - **Consumers**: the failure report and every observer in the
//!   [`SubscriberSet`](crate::SubscriberSet), called inline and in order.

mod event;

pub use event::{Event, EventKind};
