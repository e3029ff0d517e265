//! # Logging subscriber backed by `tracing`.
//!
//! [`LogWriter`] renders every [`Event`] as one structured `tracing` record.
//! Failures are logged at `warn`/`error`, the rest at `info`/`debug`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  runvisor: run started runners=2
//! DEBUG runvisor: runner started runner="http" index=0
//! WARN  runvisor: runner failed runner="db" index=1 error="connection refused"
//! INFO  runvisor: shutdown triggered reason="runner \"db\" failed: ..."
//! INFO  runvisor: all runners stopped within timeout
//! INFO  runvisor: run terminated status="success" elapsed_ms=21
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Structured logging subscriber.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let runner = e.runner.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::RunStarted => {
                tracing::info!(target: "runvisor", runners = ?e.count, "run started");
            }
            EventKind::RunnerStarted => {
                tracing::debug!(target: "runvisor", runner, index = ?e.index, "runner started");
            }
            EventKind::RunnerStopped => {
                tracing::debug!(target: "runvisor", runner, index = ?e.index, outcome = reason, "runner stopped");
            }
            EventKind::RunnerFailed => {
                tracing::warn!(target: "runvisor", runner, index = ?e.index, error = reason, "runner failed");
            }
            EventKind::RunnerErrorHandled => {
                tracing::info!(target: "runvisor", runner, index = ?e.index, error = reason, "runner error handled");
            }
            EventKind::ShutdownTriggered => {
                tracing::info!(target: "runvisor", reason, "shutdown triggered");
            }
            EventKind::CancellationIssued => {
                tracing::debug!(target: "runvisor", pending = ?e.count, timeout_ms = ?e.timeout_ms, "cancellation issued");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(target: "runvisor", "all runners stopped within timeout");
            }
            EventKind::DeadlineExceeded => {
                tracing::error!(target: "runvisor", timeout_ms = ?e.timeout_ms, stuck = reason, "shutdown deadline exceeded");
            }
            EventKind::ShutdownEscalated => {
                tracing::error!(target: "runvisor", by = reason, stuck = ?e.count, "shutdown escalated");
            }
            EventKind::CleanupStarted => {
                tracing::debug!(target: "runvisor", timeout_ms = ?e.timeout_ms, "cleanup started");
            }
            EventKind::CleanupCompleted => {
                tracing::debug!(target: "runvisor", "cleanup completed");
            }
            EventKind::CleanupFailed => {
                tracing::error!(target: "runvisor", error = reason, "cleanup failed");
            }
            EventKind::RunTerminated => {
                tracing::info!(target: "runvisor", status = reason, elapsed_ms = ?e.elapsed_ms, "run terminated");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
