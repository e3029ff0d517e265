//! # Orchestrator: concurrent start, first trigger, bounded drain, cleanup.
//!
//! ## State machine
//! ```text
//!  Idle ──run()──► Running ──first trigger──► ShuttingDown ──cleanup──► Terminated
//! ```
//!
//! ## Run path
//! ```text
//! run():
//!   spawn one task per runner (shared CancelSignal)      State::Running
//!   select (biased) {
//!     external request (OS signal / ShutdownHandle) ─► ExternalSignal
//!     runner returned failure                       ─► RunnerFailure(e)
//!     join set empty                                ─► AllCompleted
//!   }                                                    State::ShuttingDown
//!   CancelSource::cancel()
//!   drain until (deadline = now + shutdown_timeout) {
//!     all joined        ─► AllStoppedWithin
//!     deadline          ─► DeadlineExceeded, detach stragglers
//!     second request    ─► ShutdownEscalated (only with escalation enabled)
//!   }
//!   cleanup hook with a fresh CancelSignal (cleanup_timeout)
//!   Report                                               State::Terminated
//! ```
//!
//! ## Rules
//! - The first trigger fixes the [`ShutdownReason`]; later failures go to
//!   [`Report::suppressed`]. After an external signal the first of them still
//!   fails the run.
//! - Every runner failure is published as [`EventKind::RunnerFailed`] before any
//!   error handler sees it.
//! - Stragglers are never aborted; the orchestrator only stops waiting.
//! - The cleanup hook runs exactly once per run, forced or not.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinError, JoinSet};
use tokio::time::{self, Instant};
use tracing::Instrument;

use crate::cancel::CancelSource;
use crate::cleanup::CleanupRef;
use crate::config::Config;
use crate::core::builder::OrchestratorBuilder;
use crate::core::report::{CleanupOutcome, Forced, Report, ShutdownReason, SuppressedFailure};
use crate::core::shutdown::{ShutdownHandle, Triggers};
use crate::error::{CleanupError, RunnerError, panic_info};
use crate::events::{Event, EventKind};
use crate::runners::{Runner, RunnerRef};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Upper bound on flushing subscriber queues before `run` returns.
const SUBSCRIBER_FLUSH: Duration = Duration::from_secs(1);

/// Orchestrator-wide error handler: `None` absorbs the error.
pub type ErrorHandler = Arc<dyn Fn(&str, RunnerError) -> Option<RunnerError> + Send + Sync>;

/// Lifecycle state, observable through [`Orchestrator::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Runners and cleanup bound, nothing started.
    Idle,
    /// Runners launched, waiting for the first trigger.
    Running,
    /// Cancellation issued; draining runners and running cleanup.
    ShuttingDown,
    /// Final report produced.
    Terminated,
}

impl State {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Running => "running",
            State::ShuttingDown => "shutting_down",
            State::Terminated => "terminated",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Runs a fixed set of runners and shuts them down cooperatively.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use runvisor::{CancelSignal, Config, Orchestrator, RunnerError, RunnerFn};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let cfg = Config { os_signals: false, ..Config::default() };
///
///     let report = Orchestrator::builder(cfg)
///         .with_runner(RunnerFn::arc("once", |_ctx: CancelSignal| async {
///             Ok::<(), RunnerError>(())
///         }))
///         .build()
///         .run()
///         .await;
///
///     assert!(report.is_success());
/// }
/// ```
pub struct Orchestrator {
    pub(crate) cfg: Config,
    pub(crate) runners: Vec<RunnerRef>,
    pub(crate) cleanup: Option<CleanupRef>,
    pub(crate) error_handler: Option<ErrorHandler>,
    pub(crate) subscribers: Vec<Arc<dyn Subscribe>>,
    pub(crate) span: tracing::Span,
    pub(crate) trigger_tx: mpsc::UnboundedSender<Arc<str>>,
    pub(crate) trigger_rx: mpsc::UnboundedReceiver<Arc<str>>,
    pub(crate) state: watch::Sender<State>,
}

impl Orchestrator {
    /// Starts building an orchestrator with the given configuration.
    pub fn builder(cfg: Config) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }

    /// Shorthand for an orchestrator with runners only.
    pub fn new(cfg: Config, runners: Vec<RunnerRef>) -> Self {
        OrchestratorBuilder::new(cfg).with_runners(runners).build()
    }

    /// Handle that triggers an external shutdown of this orchestrator.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(self.trigger_tx.clone())
    }

    /// Receiver observing the lifecycle [`State`].
    pub fn state(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    /// Configuration of this orchestrator.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Runs all runners to termination and reports the outcome.
    ///
    /// Never returns early with an error: every path, including OS-signal
    /// registration failures, ends in a [`Report`].
    pub async fn run(self) -> Report {
        let span = self.span.clone();
        self.drive().instrument(span).await
    }

    async fn drive(self) -> Report {
        let started = Instant::now();
        let Orchestrator {
            cfg,
            runners,
            cleanup,
            error_handler,
            subscribers,
            span: _,
            trigger_tx,
            trigger_rx,
            state,
        } = self;

        let mut triggers = Triggers::new(trigger_rx);
        if cfg.os_signals {
            triggers.listen_os(trigger_tx.clone(), cfg.escalate_on_second_signal);
        }
        drop(trigger_tx);

        let run = RunCtx {
            subs: SubscriberSet::new(subscribers),
            error_handler,
            state,
        };
        let source = CancelSource::new();
        let mut set: JoinSet<Joined> = JoinSet::new();
        let mut pending = Pending::default();

        run.set_state(State::Running);
        run.emit(Event::new(EventKind::RunStarted).with_count(runners.len()));
        for (index, runner) in runners.into_iter().enumerate() {
            let name: Arc<str> = Arc::from(runner.name());
            let ctx = source.signal();
            run.emit(Event::new(EventKind::RunnerStarted).with_runner(index, name.clone()));

            let handle = set.spawn(async move {
                let outcome = AssertUnwindSafe(async { runner.run(ctx).await })
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Err(RunnerError::Panicked {
                            info: panic_info(&*payload),
                        })
                    });
                Joined {
                    index,
                    runner,
                    outcome,
                }
            });
            pending.track(handle.id(), index, name);
        }

        let reason = loop {
            tokio::select! {
                biased;
                Some(label) = triggers.next() => {
                    break ShutdownReason::ExternalSignal { source: label };
                }
                joined = set.join_next() => match joined {
                    None => break ShutdownReason::AllCompleted,
                    Some(Ok(j)) => {
                        let name = pending.finish(j.index).unwrap_or_else(|| Arc::from(j.runner.name()));
                        if let Some(error) = run.settle(j.index, &name, &*j.runner, j.outcome) {
                            break ShutdownReason::RunnerFailure { runner: name, index: j.index, error };
                        }
                    }
                    Some(Err(err)) => pending.abandon(&err),
                },
            }
        };

        run.set_state(State::ShuttingDown);
        run.emit(Event::new(EventKind::ShutdownTriggered).with_reason(reason.to_string()));
        source.cancel();
        run.emit(
            Event::new(EventKind::CancellationIssued)
                .with_count(pending.len())
                .with_timeout(cfg.shutdown_timeout),
        );

        if cfg.is_immediate_shutdown() && !pending.is_empty() {
            tracing::debug!(pending = pending.len(), "zero shutdown timeout; not waiting for runners");
        }

        let mut suppressed = Vec::new();
        let deadline = Instant::now() + cfg.shutdown_timeout;
        let forced = loop {
            tokio::select! {
                biased;
                joined = set.join_next() => match joined {
                    None => break None,
                    Some(Ok(j)) => {
                        let name = pending.finish(j.index).unwrap_or_else(|| Arc::from(j.runner.name()));
                        if let Some(error) = run.settle(j.index, &name, &*j.runner, j.outcome) {
                            suppressed.push(SuppressedFailure { runner: name, index: j.index, error });
                        }
                    }
                    Some(Err(err)) => pending.abandon(&err),
                },
                _ = time::sleep_until(deadline) => {
                    break Some(Forced::Deadline {
                        timeout: cfg.shutdown_timeout,
                        stuck: pending.stuck(),
                    });
                }
                Some(by) = triggers.next(), if cfg.escalate_on_second_signal => {
                    break Some(Forced::Escalated {
                        by,
                        stuck: pending.stuck(),
                    });
                }
            }
        };

        match &forced {
            None => run.emit(Event::new(EventKind::AllStoppedWithin)),
            Some(f) => {
                set.detach_all();
                let ev = match f {
                    Forced::Deadline { timeout, stuck } => Event::new(EventKind::DeadlineExceeded)
                        .with_timeout(*timeout)
                        .with_reason(join_names(stuck)),
                    Forced::Escalated { by, .. } => {
                        Event::new(EventKind::ShutdownEscalated).with_reason(by.clone())
                    }
                };
                run.emit(ev.with_count(f.stuck().len()));
            }
        }

        let cleanup = match cleanup {
            Some(hook) => run.cleanup(hook, cfg.cleanup_timeout).await,
            None => CleanupOutcome::Skipped,
        };

        let report = Report {
            reason,
            forced,
            cleanup,
            suppressed,
            elapsed: started.elapsed(),
        };

        triggers.close();
        run.set_state(State::Terminated);
        run.emit(
            Event::new(EventKind::RunTerminated)
                .with_reason(report.status().as_label())
                .with_elapsed(report.elapsed),
        );
        run.subs.shutdown(SUBSCRIBER_FLUSH).await;
        report
    }
}

/// Runners that have not returned yet, by input position.
#[derive(Default)]
struct Pending {
    by_index: BTreeMap<usize, Arc<str>>,
    by_task: HashMap<task::Id, usize>,
}

impl Pending {
    fn track(&mut self, id: task::Id, index: usize, name: Arc<str>) {
        self.by_index.insert(index, name);
        self.by_task.insert(id, index);
    }

    fn finish(&mut self, index: usize) -> Option<Arc<str>> {
        self.by_task.retain(|_, i| *i != index);
        self.by_index.remove(&index)
    }

    /// Forgets a runner whose task ended without an outcome (aborted by the runtime).
    fn abandon(&mut self, err: &JoinError) {
        let Some(index) = self.by_task.remove(&err.id()) else {
            tracing::warn!(error = %err, "unknown runner task ended abnormally");
            return;
        };
        let name = self.by_index.remove(&index);
        tracing::warn!(
            runner = name.as_deref().unwrap_or("-"),
            index,
            error = %err,
            "runner task ended abnormally"
        );
    }

    fn len(&self) -> usize {
        self.by_index.len()
    }

    fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    fn stuck(&self) -> Vec<Arc<str>> {
        self.by_index.values().cloned().collect()
    }
}

/// Result of one runner task.
struct Joined {
    index: usize,
    runner: RunnerRef,
    outcome: Result<(), RunnerError>,
}

/// Per-run plumbing shared by the phases of [`Orchestrator::drive`].
struct RunCtx {
    subs: SubscriberSet,
    error_handler: Option<ErrorHandler>,
    state: watch::Sender<State>,
}

impl RunCtx {
    fn emit(&self, ev: Event) {
        self.subs.emit(ev);
    }

    fn set_state(&self, next: State) {
        self.state.send_replace(next);
    }

    /// Classifies a runner outcome; `Some` is a failure that survived both handlers.
    fn settle(
        &self,
        index: usize,
        name: &Arc<str>,
        runner: &dyn Runner,
        outcome: Result<(), RunnerError>,
    ) -> Option<RunnerError> {
        let err = match outcome {
            Ok(()) => {
                self.stopped(index, name, "completed");
                return None;
            }
            Err(RunnerError::Canceled) => {
                self.stopped(index, name, "canceled");
                return None;
            }
            Err(err) => err,
        };

        let message = err.to_string();
        self.emit(
            Event::new(EventKind::RunnerFailed)
                .with_runner(index, name.clone())
                .with_reason(message.as_str()),
        );

        let surviving = runner
            .handle_error(err)
            .err()
            .and_then(|err| match &self.error_handler {
                Some(handler) => handler(&**name, err),
                None => Some(err),
            })
            .filter(|err| !err.is_canceled());

        if surviving.is_none() {
            self.emit(
                Event::new(EventKind::RunnerErrorHandled)
                    .with_runner(index, name.clone())
                    .with_reason(message),
            );
        }
        surviving
    }

    fn stopped(&self, index: usize, name: &Arc<str>, outcome: &'static str) {
        self.emit(
            Event::new(EventKind::RunnerStopped)
                .with_runner(index, name.clone())
                .with_reason(outcome),
        );
    }

    async fn cleanup(&self, hook: CleanupRef, timeout: Duration) -> CleanupOutcome {
        self.emit(Event::new(EventKind::CleanupStarted).with_timeout(timeout));

        let scope = CancelSource::with_timeout(timeout);
        let ctx = scope.signal();
        let fut = AssertUnwindSafe(async { hook.cleanup(ctx).await }).catch_unwind();

        let res = match time::timeout(timeout, fut).await {
            Ok(Ok(res)) => res,
            Ok(Err(payload)) => Err(CleanupError::Panicked {
                info: panic_info(&*payload),
            }),
            Err(_elapsed) => Err(CleanupError::Timeout { timeout }),
        };
        scope.cancel();

        match res {
            Ok(()) => {
                self.emit(Event::new(EventKind::CleanupCompleted));
                CleanupOutcome::Completed
            }
            Err(err) => {
                self.emit(Event::new(EventKind::CleanupFailed).with_reason(err.to_string()));
                CleanupOutcome::Failed(err)
            }
        }
    }
}

fn join_names(names: &[Arc<str>]) -> String {
    names
        .iter()
        .map(|n| &**n)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelSignal;
    use crate::cleanup::CleanupFn;
    use crate::error::RuntimeError;
    use crate::runners::RunnerFn;
    use crate::ExitStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn cfg(shutdown_ms: u64) -> Config {
        Config {
            shutdown_timeout: Duration::from_millis(shutdown_ms),
            cleanup_timeout: Duration::from_secs(1),
            os_signals: false,
            escalate_on_second_signal: false,
        }
    }

    fn succeeds_after(name: &'static str, ms: u64) -> RunnerRef {
        RunnerFn::arc(name, move |_ctx: CancelSignal| async move {
            time::sleep(Duration::from_millis(ms)).await;
            Ok::<(), RunnerError>(())
        })
    }

    fn fails_now(name: &'static str, msg: &'static str) -> RunnerRef {
        RunnerFn::arc(name, move |_ctx: CancelSignal| async move {
            Err::<(), _>(RunnerError::fail(msg))
        })
    }

    fn until_cancelled(name: &'static str, observed: Arc<AtomicBool>) -> RunnerRef {
        RunnerFn::arc(name, move |ctx: CancelSignal| {
            let observed = observed.clone();
            async move {
                ctx.cancelled().await;
                observed.store(true, Ordering::SeqCst);
                Err::<(), _>(RunnerError::Canceled)
            }
        })
    }

    fn ignores_cancel(name: &'static str, ms: u64) -> RunnerRef {
        RunnerFn::arc(name, move |_ctx: CancelSignal| async move {
            time::sleep(Duration::from_millis(ms)).await;
            Ok::<(), RunnerError>(())
        })
    }

    fn counting_cleanup(calls: Arc<AtomicUsize>, result: Result<(), CleanupError>) -> CleanupRef {
        CleanupFn::arc(move |_ctx: CancelSignal| {
            let calls = calls.clone();
            let result = result.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                result
            }
        })
    }

    #[derive(Default)]
    struct Recorder {
        kinds: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.kinds.lock().unwrap().push(ev.kind);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_runners_complete_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let report = Orchestrator::builder(cfg(1_000))
            .with_cleanup(counting_cleanup(calls.clone(), Ok(())))
            .build()
            .run()
            .await;

        assert_eq!(report.reason, ShutdownReason::AllCompleted);
        assert!(report.is_success());
        assert!(report.elapsed < Duration::from_millis(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_success_round_trip() {
        let calls = Arc::new(AtomicUsize::new(0));
        let report = Orchestrator::builder(cfg(1_000))
            .with_runner(succeeds_after("a", 10))
            .with_runner(succeeds_after("b", 20))
            .with_cleanup(counting_cleanup(calls.clone(), Ok(())))
            .build()
            .run()
            .await;

        assert_eq!(report.reason, ShutdownReason::AllCompleted);
        assert_eq!(report.status(), ExitStatus::Success);
        assert_eq!(report.cleanup, CleanupOutcome::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(report.elapsed >= Duration::from_millis(20));
        assert!(report.elapsed < Duration::from_millis(30), "{:?}", report.elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_cancels_siblings() {
        let observed = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(AtomicUsize::new(0));
        let report = Orchestrator::builder(cfg(5_000))
            .with_runner(until_cancelled("a", observed.clone()))
            .with_runner(fails_now("b", "boom"))
            .with_cleanup(counting_cleanup(calls.clone(), Ok(())))
            .build()
            .run()
            .await;

        assert_eq!(
            report.reason,
            ShutdownReason::RunnerFailure {
                runner: "b".into(),
                index: 1,
                error: RunnerError::fail("boom"),
            }
        );
        assert!(observed.load(Ordering::SeqCst));
        assert!(report.forced.is_none());
        assert!(report.elapsed < Duration::from_secs(5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.cleanup, CleanupOutcome::Completed);
        match report.into_result() {
            Err(RuntimeError::RunnerFailed { runner, source }) => {
                assert_eq!(&*runner, "b");
                assert_eq!(source, RunnerError::fail("boom"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_racing_failures_keep_exactly_one_reason() {
        let report = Orchestrator::builder(cfg(1_000))
            .with_runner(fails_now("a", "first"))
            .with_runner(fails_now("b", "second"))
            .build()
            .run()
            .await;

        assert!(matches!(report.reason, ShutdownReason::RunnerFailure { .. }));
        assert_eq!(report.suppressed.len(), 1);
        assert_eq!(report.status(), ExitStatus::Failed);
        assert!(report.forced.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_runner_hits_deadline_after_signal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orch = Orchestrator::builder(cfg(200))
            .with_runner(ignores_cancel("stubborn", 10_000))
            .with_cleanup(counting_cleanup(calls.clone(), Ok(())))
            .build();
        assert!(orch.shutdown_handle().request("test"));

        let report = orch.run().await;

        assert_eq!(
            report.reason,
            ShutdownReason::ExternalSignal {
                source: "test".into()
            }
        );
        assert_eq!(
            report.forced,
            Some(Forced::Deadline {
                timeout: Duration::from_millis(200),
                stuck: vec!["stubborn".into()],
            })
        );
        assert_eq!(report.status(), ExitStatus::Forced);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(report.elapsed >= Duration::from_millis(200));
        assert!(report.elapsed < Duration::from_millis(250), "{:?}", report.elapsed);
        assert!(matches!(
            report.error(),
            Some(RuntimeError::DeadlineExceeded { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_failure_fails_successful_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let report = Orchestrator::builder(cfg(1_000))
            .with_runner(succeeds_after("a", 5))
            .with_cleanup(counting_cleanup(calls.clone(), Err(CleanupError::fail("disk"))))
            .build()
            .run()
            .await;

        assert_eq!(report.reason, ShutdownReason::AllCompleted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.status(), ExitStatus::Failed);
        assert!(matches!(
            report.error(),
            Some(RuntimeError::CleanupFailed {
                source: CleanupError::Fail { .. }
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_is_bounded_by_its_own_timeout() {
        let saw_deadline = Arc::new(AtomicBool::new(false));
        let flag = saw_deadline.clone();
        let hook = CleanupFn::arc(move |ctx: CancelSignal| {
            let flag = flag.clone();
            async move {
                flag.store(ctx.deadline().is_some(), Ordering::SeqCst);
                std::future::pending::<()>().await;
                Ok::<(), CleanupError>(())
            }
        });
        let mut config = cfg(1_000);
        config.cleanup_timeout = Duration::from_millis(300);

        let report = Orchestrator::builder(config)
            .with_cleanup(hook)
            .build()
            .run()
            .await;

        assert!(saw_deadline.load(Ordering::SeqCst));
        assert_eq!(
            report.cleanup,
            CleanupOutcome::Failed(CleanupError::Timeout {
                timeout: Duration::from_millis(300)
            })
        );
        assert!(report.elapsed >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_escalates() {
        let mut config = cfg(60_000);
        config.escalate_on_second_signal = true;
        let orch = Orchestrator::builder(config)
            .with_runner(ignores_cancel("stubborn", 120_000))
            .build();
        let handle = orch.shutdown_handle();
        handle.request("first");
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(50)).await;
            handle.request("second");
        });

        let report = orch.run().await;

        assert_eq!(
            report.forced,
            Some(Forced::Escalated {
                by: "second".into(),
                stuck: vec!["stubborn".into()],
            })
        );
        assert_eq!(report.status(), ExitStatus::Forced);
        assert!(report.elapsed < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_runner_is_a_failure() {
        let bad = RunnerFn::arc("bad", |_ctx: CancelSignal| async {
            if true {
                panic!("kaboom");
            }
            Ok::<(), RunnerError>(())
        });
        let report = Orchestrator::new(cfg(1_000), vec![bad]).run().await;

        assert!(matches!(
            report.reason,
            ShutdownReason::RunnerFailure {
                error: RunnerError::Panicked { ref info },
                ..
            } if info == "kaboom"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_absorbed_errors_are_still_published() {
        let rec = Arc::new(Recorder::default());
        let report = Orchestrator::builder(cfg(1_000))
            .with_runner(fails_now("flaky", "transient"))
            .with_error_handler(|_name, _err| None)
            .with_subscriber(rec.clone())
            .build()
            .run()
            .await;

        assert_eq!(report.reason, ShutdownReason::AllCompleted);
        assert!(report.is_success());
        let kinds = rec.kinds.lock().unwrap().clone();
        assert!(kinds.contains(&EventKind::RunnerFailed));
        assert!(kinds.contains(&EventKind::RunnerErrorHandled));
        assert_eq!(kinds.last(), Some(&EventKind::RunTerminated));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_after_signal_keeps_reason_but_fails_run() {
        let failing_on_cancel = RunnerFn::arc("db", |ctx: CancelSignal| async move {
            ctx.cancelled().await;
            Err::<(), _>(RunnerError::fail("flush failed"))
        });
        let orch = Orchestrator::new(cfg(1_000), vec![failing_on_cancel]);
        orch.shutdown_handle().request("SIGTERM");

        let report = orch.run().await;

        assert_eq!(
            report.reason,
            ShutdownReason::ExternalSignal {
                source: "SIGTERM".into()
            }
        );
        assert_eq!(report.suppressed.len(), 1);
        assert_eq!(&*report.suppressed[0].runner, "db");
        assert!(report.forced.is_none());
        assert_eq!(report.status(), ExitStatus::Failed);
        match report.error() {
            Some(RuntimeError::RunnerFailed { runner, source }) => {
                assert_eq!(&*runner, "db");
                assert_eq!(source, RunnerError::fail("flush failed"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_stop_after_signal_is_success() {
        let observed = Arc::new(AtomicBool::new(false));
        let orch = Orchestrator::new(cfg(1_000), vec![until_cancelled("api", observed.clone())]);
        orch.shutdown_handle().request("SIGTERM");

        let report = orch.run().await;

        assert!(observed.load(Ordering::SeqCst));
        assert!(report.suppressed.is_empty());
        assert_eq!(report.status(), ExitStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_and_handle_after_termination() {
        let orch = Orchestrator::new(cfg(1_000), vec![succeeds_after("a", 1)]);
        let state = orch.state();
        let handle = orch.shutdown_handle();
        assert_eq!(*state.borrow(), State::Idle);

        let report = orch.run().await;

        assert!(report.is_success());
        assert_eq!(*state.borrow(), State::Terminated);
        assert!(!handle.request("late"));
    }

    #[tokio::test]
    async fn test_aborted_task_is_not_reported_stuck() {
        let mut set = JoinSet::new();
        let mut pending = Pending::default();
        let gone = set.spawn(std::future::pending::<()>());
        let slow = set.spawn(std::future::pending::<()>());
        pending.track(gone.id(), 0, "gone".into());
        pending.track(slow.id(), 1, "slow".into());

        gone.abort();
        let err = set.join_next().await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        pending.abandon(&err);

        assert_eq!(pending.stuck(), vec![Arc::<str>::from("slow")]);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.finish(1).as_deref(), Some("slow"));
        assert!(pending.is_empty());
        set.abort_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_forces_pending_runners() {
        let orch = Orchestrator::new(cfg(0), vec![ignores_cancel("slow", 1_000)]);
        orch.shutdown_handle().request("now");

        let report = orch.run().await;

        assert!(matches!(report.forced, Some(Forced::Deadline { .. })));
        assert_eq!(report.forced.as_ref().map(|f| f.stuck().len()), Some(1));
        assert!(report.elapsed < Duration::from_millis(5));
    }
}
