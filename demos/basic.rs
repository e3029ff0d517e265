//! # Example: basic
//!
//! Two long-running runners stopped by Ctrl-C (or SIGTERM), with a cleanup hook.
//!
//! Demonstrates how to:
//! - Define runners with [`RunnerFn`] that watch their [`CancelSignal`].
//! - Attach a cleanup hook and the [`LogWriter`] subscriber.
//! - Map the [`Report`](runvisor::Report) to a process exit code.
//!
//! ## Flow
//! ```text
//! Orchestrator::run()
//!     ├─► spawn "ticker", "heartbeat"
//!     ├─► Ctrl-C            ─► ShutdownTriggered(external signal SIGINT)
//!     ├─► cancel            ─► runners return Canceled
//!     ├─► AllStoppedWithin
//!     ├─► cleanup hook
//!     └─► exit code 0
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example basic
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use runvisor::{
    CancelSignal, CleanupError, CleanupFn, Config, LogWriter, Orchestrator, RunnerError, RunnerFn,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Give runners 5s to stop after Ctrl-C; a second Ctrl-C stops waiting.
    let cfg = Config {
        shutdown_timeout: Duration::from_secs(5),
        cleanup_timeout: Duration::from_secs(2),
        escalate_on_second_signal: true,
        ..Config::default()
    };

    // 2. Tick until cancelled.
    let ticker = RunnerFn::arc("ticker", |ctx: CancelSignal| async move {
        let mut n = 0u64;
        while !ctx.is_cancelled() {
            n += 1;
            println!("[ticker] tick {n}");
            ctx.run_until_cancelled(tokio::time::sleep(Duration::from_secs(1)))
                .await;
        }
        Err::<(), _>(RunnerError::Canceled)
    });

    // 3. Same, but takes a moment to wind down.
    let heartbeat = RunnerFn::arc("heartbeat", |ctx: CancelSignal| async move {
        ctx.cancelled().await;
        println!("[heartbeat] flushing");
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok::<(), RunnerError>(())
    });

    // 4. Cleanup runs once every runner stopped (or the wait was given up).
    let cleanup = CleanupFn::arc(|ctx: CancelSignal| async move {
        println!("[cleanup] remaining budget: {:?}", ctx.remaining());
        Ok::<(), CleanupError>(())
    });

    println!("press Ctrl-C to stop");
    let report = Orchestrator::builder(cfg)
        .with_runner(ticker)
        .with_runner(heartbeat)
        .with_cleanup(cleanup)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build()
        .run()
        .await;

    println!("reason: {}, status: {}", report.reason, report.status().as_label());
    report.status().into()
}
