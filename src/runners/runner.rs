//! # Runner trait.
//!
//! A runner receives a [`CancelSignal`] and runs until it finishes or observes
//! cancellation. It is started exactly once by the orchestrator, concurrently
//! with all its siblings.
//!
//! ## Outcomes
//! - `Ok(())`: success
//! - `Err(RunnerError::Canceled)`: stopped because cancellation was observed (non-fatal)
//! - any other `Err`: failure; the orchestrator shuts down all siblings

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::cancel::CancelSignal;
use crate::error::RunnerError;

/// Future returned by [`Runner::run`].
pub type BoxRunnerFuture = BoxFuture<'static, Result<(), RunnerError>>;

/// Shared handle to a runner.
pub type RunnerRef = Arc<dyn Runner>;

/// # Concurrent, cancelable unit of work.
///
/// # Example
/// ```
/// use runvisor::{BoxRunnerFuture, CancelSignal, Runner, RunnerError};
///
/// struct Ticker;
///
/// impl Runner for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     fn run(&self, ctx: CancelSignal) -> BoxRunnerFuture {
///         Box::pin(async move {
///             ctx.cancelled().await;
///             Err(RunnerError::Canceled)
///         })
///     }
/// }
/// ```
pub trait Runner: Send + Sync + 'static {
    /// Human-readable name, used in events and to wrap failures.
    fn name(&self) -> &str;

    /// Creates the runner's future.
    ///
    /// Implementations must watch `ctx` and return promptly once it is cancelled;
    /// the orchestrator never aborts a runner, it only stops waiting for it.
    fn run(&self, ctx: CancelSignal) -> BoxRunnerFuture;

    /// Last chance for the runner to absorb its own error.
    ///
    /// Called with every non-cancellation error this runner returned.
    /// `Ok(())` turns the outcome into a clean completion; the default
    /// passes the error through.
    fn handle_error(&self, err: RunnerError) -> Result<(), RunnerError> {
        Err(err)
    }
}
