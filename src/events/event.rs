//! # Events emitted during an orchestration run.
//!
//! [`EventKind`] classifies events in four groups:
//! - **Run events**: start and final termination
//! - **Runner events**: start, stop, failure, absorbed error
//! - **Shutdown events**: trigger, cancellation, drain result
//! - **Cleanup events**: hook start and result
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Subscribers see events in `seq` order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use runvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RunnerFailed)
//!     .with_runner(1, "db")
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::RunnerFailed);
//! assert_eq!(ev.runner.as_deref(), Some("db"));
//! assert_eq!(ev.index, Some(1));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of orchestration events.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Run events ===
    /// Runners are about to be launched.
    ///
    /// Sets:
    /// - `count`: number of runners
    RunStarted,

    /// Run finished; the final status is known.
    ///
    /// Sets:
    /// - `reason`: exit status label
    /// - `elapsed_ms`: total wall time
    RunTerminated,

    // === Runner events ===
    /// Runner launched on its own task.
    ///
    /// Sets:
    /// - `runner`, `index`
    RunnerStarted,

    /// Runner returned success or the cancelled outcome.
    ///
    /// Sets:
    /// - `runner`, `index`
    /// - `reason`: `"completed"` or `"canceled"`
    RunnerStopped,

    /// Runner returned a failure (including panics).
    ///
    /// Published for **every** failure, before any error handler runs.
    ///
    /// Sets:
    /// - `runner`, `index`
    /// - `reason`: error message
    RunnerFailed,

    /// A failure was absorbed by `Runner::handle_error` or the orchestrator error handler.
    ///
    /// Sets:
    /// - `runner`, `index`
    /// - `reason`: the absorbed error message
    RunnerErrorHandled,

    // === Shutdown events ===
    /// First trigger observed; the run enters `ShuttingDown`.
    ///
    /// Sets:
    /// - `reason`: shutdown reason
    ShutdownTriggered,

    /// Cancellation was broadcast to all runners.
    ///
    /// Sets:
    /// - `timeout_ms`: shutdown timeout
    /// - `count`: runners still running
    CancellationIssued,

    /// All runners stopped within the shutdown timeout.
    AllStoppedWithin,

    /// Shutdown timeout elapsed before all runners stopped.
    ///
    /// Sets:
    /// - `timeout_ms`: shutdown timeout
    /// - `count`: stuck runners
    /// - `reason`: stuck runner names
    DeadlineExceeded,

    /// A repeated external request cut the drain short.
    ///
    /// Sets:
    /// - `reason`: label of the request
    /// - `count`: stuck runners
    ShutdownEscalated,

    // === Cleanup events ===
    /// Cleanup hook invoked.
    ///
    /// Sets:
    /// - `timeout_ms`: cleanup timeout
    CleanupStarted,

    /// Cleanup hook returned successfully.
    CleanupCompleted,

    /// Cleanup hook failed, timed out, or panicked.
    ///
    /// Sets:
    /// - `reason`: error message
    CleanupFailed,
}

/// Orchestration event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Runner name, if applicable.
    pub runner: Option<Arc<str>>,
    /// Runner position in the input list, if applicable.
    pub index: Option<usize>,
    /// Human-readable reason (errors, shutdown cause, status).
    pub reason: Option<Arc<str>>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Elapsed time in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Runner count (launched, pending, or stuck depending on kind).
    pub count: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            runner: None,
            index: None,
            reason: None,
            timeout_ms: None,
            elapsed_ms: None,
            count: None,
        }
    }

    /// Attaches the runner position and name.
    #[inline]
    pub fn with_runner(mut self, index: usize, name: impl Into<Arc<str>>) -> Self {
        self.index = Some(index);
        self.runner = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a runner count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n);
        self
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
