//! # Runner abstractions.
//!
//! - [`Runner`] - trait for a concurrent, cancelable unit of work
//! - [`RunnerFn`] - closure-backed runner
//! - [`RunnerRef`] - shared reference to a runner (`Arc<dyn Runner>`)

mod runner;
mod runner_fn;

pub use runner::{BoxRunnerFuture, Runner, RunnerRef};
pub use runner_fn::RunnerFn;
