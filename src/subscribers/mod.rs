//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out,
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Orchestrator ── emit(Event) ──► SubscriberSet ──┬──► LogWriter  (tracing)
//!                                                 ├──► Metrics    (user)
//!                                                 └──► Custom ... (user)
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
