//! # Example: failure
//!
//! One runner fails, its sibling is cancelled, and one straggler ignores the
//! cancel so the run ends forced.
//!
//! Demonstrates how to:
//! - Absorb some errors with a per-runner [`RunnerFn::with_error_handler`].
//! - Watch the lifecycle [`State`] from another task.
//! - Inspect the [`Report`](runvisor::Report) after a forced shutdown.
//!
//! ## Flow
//! ```text
//! Orchestrator::run()
//!     ├─► "cache" fails with a transient error ─► absorbed (RunnerErrorHandled)
//!     ├─► "db" fails                           ─► ShutdownTriggered(runner failure)
//!     ├─► cancel                               ─► "api" returns Canceled
//!     ├─► "legacy" keeps sleeping              ─► DeadlineExceeded after 1s
//!     ├─► cleanup hook
//!     └─► exit code 2
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example failure
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use runvisor::{
    CancelSignal, CleanupError, CleanupFn, Config, LogWriter, Orchestrator, RunnerError, RunnerFn,
    RunnerRef, State,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let cfg = Config {
        shutdown_timeout: Duration::from_secs(1),
        cleanup_timeout: Duration::from_secs(1),
        os_signals: false,
        ..Config::default()
    };

    let api: RunnerRef = RunnerFn::arc("api", |ctx: CancelSignal| async move {
        ctx.cancelled().await;
        println!("[api] draining connections");
        Err::<(), _>(RunnerError::Canceled)
    });

    let cache: RunnerRef = Arc::new(
        RunnerFn::new("cache", |_ctx: CancelSignal| async {
            Err::<(), _>(RunnerError::fail("warmup skipped"))
        })
        .with_error_handler(|err| match err {
            RunnerError::Fail { ref error } if error.contains("skipped") => Ok(()),
            other => Err(other),
        }),
    );

    let db: RunnerRef = RunnerFn::arc("db", |_ctx: CancelSignal| async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Err::<(), _>(RunnerError::fail("connection refused"))
    });

    let legacy: RunnerRef = RunnerFn::arc("legacy", |_ctx: CancelSignal| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok::<(), RunnerError>(())
    });

    let orch = Orchestrator::builder(cfg)
        .with_runners([api, cache, db, legacy])
        .with_cleanup(CleanupFn::arc(|_ctx: CancelSignal| async {
            println!("[cleanup] closing pools");
            Ok::<(), CleanupError>(())
        }))
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    let mut state = orch.state();
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let now = *state.borrow_and_update();
            println!("[state] {now}");
            if now == State::Terminated {
                break;
            }
        }
    });

    let report = orch.run().await;

    println!("reason: {}", report.reason);
    if let Some(forced) = &report.forced {
        println!("stuck: {:?}", forced.stuck());
    }
    if let Some(err) = report.error() {
        println!("error: {} ({})", err.as_message(), err.as_label());
    }
    report.status().into()
}
