//! Orchestration events.
//!
//! The [`Orchestrator`](crate::Orchestrator) publishes an [`Event`] on every
//! lifecycle transition; [`SubscriberSet`](crate::SubscriberSet) fans them out
//! to user [`Subscribe`](crate::Subscribe) implementations.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata

mod event;

pub use event::{Event, EventKind};
