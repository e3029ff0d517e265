//! # Cleanup hook.
//!
//! A single callback invoked once after the runner set has stopped. It gets a
//! fresh [`CancelSignal`](crate::CancelSignal) bounded by
//! [`Config::cleanup_timeout`](crate::Config::cleanup_timeout), independent from
//! the signal the runners observed.

mod cleanup_fn;

pub use cleanup_fn::CleanupFn;

use std::sync::Arc;

use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::error::CleanupError;

/// Shared handle to a cleanup hook.
pub type CleanupRef = Arc<dyn Cleanup>;

/// Releases resources owned outside the runners (pools, files, sockets).
#[async_trait]
pub trait Cleanup: Send + Sync + 'static {
    /// Runs the cleanup. `ctx` reports cancelled once the cleanup timeout elapses.
    async fn cleanup(&self, ctx: CancelSignal) -> Result<(), CleanupError>;
}
