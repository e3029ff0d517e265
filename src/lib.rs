//! # runvisor
//!
//! **Runvisor** is a small process-lifecycle orchestrator for tokio programs.
//!
//! It starts a fixed set of runners concurrently, waits for the first shutdown
//! trigger (a runner failure, an external signal, or all runners completing),
//! cancels everything that is still running, waits a bounded time for it to
//! stop, runs an optional cleanup hook and reports one deterministic status.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Runner    │   │    Runner    │   │    Runner    │
//!     │   (http)     │   │   (worker)   │   │   (metrics)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                     │
//! │  - CancelSource (one broadcast token, runners get CancelSignal)   │
//! │  - JoinSet (one task per runner)                                  │
//! │  - Triggers (OS signals + ShutdownHandle requests)                │
//! │  - SubscriberSet (fans out lifecycle events)                      │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               ▼
//!   first trigger ──► cancel ──► bounded drain ──► cleanup ──► Report
//! ```
//!
//! ### Result priority
//! ```text
//! forced (deadline/escalation)  ─► ExitStatus::Forced   (code 2)
//! first runner failure          ─► ExitStatus::Failed   (code 1)
//! failure while draining        ─► ExitStatus::Failed   (code 1)
//! cleanup failure               ─► ExitStatus::Failed   (code 1)
//! otherwise (incl. signal stop) ─► ExitStatus::Success  (code 0)
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                         |
//! |-------------------|-------------------------------------------------------------|--------------------------------------------|
//! | **Runners**       | Concurrent units of work, closure or trait based.           | [`Runner`], [`RunnerFn`], [`RunnerRef`]    |
//! | **Cancellation**  | Read-only broadcast signal with optional deadline.          | [`CancelSignal`], [`CancelSource`]         |
//! | **Orchestration** | Start, first trigger, bounded drain, cleanup.               | [`Orchestrator`], [`OrchestratorBuilder`]  |
//! | **Results**       | Shutdown reason, forced record, single surfaced error.      | [`Report`], [`ExitStatus`], [`RuntimeError`] |
//! | **Observability** | Lifecycle events, `tracing`-backed logger.                  | [`Subscribe`], [`Event`], [`LogWriter`]    |
//! | **Configuration** | Timeouts and signal policy.                                 | [`Config`]                                 |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use runvisor::{
//!     CancelSignal, CleanupError, CleanupFn, Config, LogWriter, Orchestrator, RunnerError,
//!     RunnerFn,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let cfg = Config {
//!         shutdown_timeout: Duration::from_secs(5),
//!         os_signals: false,
//!         ..Config::default()
//!     };
//!
//!     let ticker = RunnerFn::arc("ticker", |ctx: CancelSignal| async move {
//!         while !ctx.is_cancelled() {
//!             tokio::time::sleep(Duration::from_millis(10)).await;
//!         }
//!         Err::<(), _>(RunnerError::Canceled)
//!     });
//!     let once = RunnerFn::arc("once", |_ctx: CancelSignal| async {
//!         Err::<(), _>(RunnerError::fail("config missing"))
//!     });
//!
//!     let report = Orchestrator::builder(cfg)
//!         .with_runner(ticker)
//!         .with_runner(once)
//!         .with_cleanup(CleanupFn::arc(|_ctx: CancelSignal| async {
//!             Ok::<(), CleanupError>(())
//!         }))
//!         .with_subscriber(Arc::new(LogWriter::new()))
//!         .build()
//!         .run()
//!         .await;
//!
//!     assert_eq!(report.status().code(), 1);
//!     // In a real binary: `return report.status().into();` from `main() -> ExitCode`.
//!     let _code: std::process::ExitCode = report.status().into();
//! }
//! ```
mod cancel;
mod cleanup;
mod config;
mod core;
mod error;
mod events;
mod runners;
mod subscribers;

// ---- Public re-exports ----

pub use cancel::{CancelSignal, CancelSource};
pub use cleanup::{Cleanup, CleanupFn, CleanupRef};
pub use config::Config;
pub use self::core::{
    CleanupOutcome, ErrorHandler, ExitStatus, Forced, Orchestrator, OrchestratorBuilder, Report,
    ShutdownHandle, ShutdownReason, State, SuppressedFailure,
};
pub use error::{CleanupError, RunnerError, RuntimeError};
pub use events::{Event, EventKind};
pub use runners::{BoxRunnerFuture, Runner, RunnerFn, RunnerRef};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
