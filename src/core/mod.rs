//! Runtime core: orchestration and lifecycle.
//!
//! The public API from this module is [`Orchestrator`] with its builder and
//! the result types it produces.
//!
//! Internal modules:
//! - [`orchestrator`]: state machine, trigger select, bounded drain, cleanup;
//! - [`builder`]: explicit construction of an orchestrator;
//! - [`shutdown`]: OS-signal adapter and programmatic shutdown handle;
//! - [`report`]: shutdown reason, forced record, error aggregation.

mod builder;
mod orchestrator;
mod report;
mod shutdown;

pub use builder::OrchestratorBuilder;
pub use orchestrator::{ErrorHandler, Orchestrator, State};
pub use report::{CleanupOutcome, ExitStatus, Forced, Report, ShutdownReason, SuppressedFailure};
pub use shutdown::ShutdownHandle;
