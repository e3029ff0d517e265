//! # Outcome of an orchestration run.
//!
//! [`Report`] keeps everything the run observed; [`Report::error`] reduces it to
//! at most one [`RuntimeError`] using a fixed priority:
//!
//! ```text
//! forced (deadline / escalation) ─► DeadlineExceeded | Escalated   (ExitStatus::Forced)
//! reason = RunnerFailure(e)      ─► RunnerFailed { runner, e }     (ExitStatus::Failed)
//! failure while draining         ─► RunnerFailed { first of them }  (ExitStatus::Failed)
//! cleanup hook failed            ─► CleanupFailed                  (ExitStatus::Failed)
//! otherwise                      ─► success                        (ExitStatus::Success)
//! ```
//!
//! A failure while draining never changes [`Report::reason`]; a signal-driven
//! stop stays `ExternalSignal` but no longer counts as a success.
//!
//! A cleanup failure is always kept in [`Report::cleanup`], even when a
//! higher-priority error is the one surfaced.

use std::fmt;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{CleanupError, RunnerError, RuntimeError};

/// Why the run left the `Running` state. Produced once per run.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// OS signal or [`ShutdownHandle`](crate::ShutdownHandle) request.
    ExternalSignal {
        /// Signal name (`"SIGTERM"`) or the label passed to the handle.
        source: Arc<str>,
    },
    /// The first runner failure.
    RunnerFailure {
        /// Name of the failing runner.
        runner: Arc<str>,
        /// Position of the runner in the input list.
        index: usize,
        /// The error it returned.
        error: RunnerError,
    },
    /// Every runner returned success or the cancelled outcome.
    AllCompleted,
}

impl ShutdownReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownReason::ExternalSignal { .. } => "external_signal",
            ShutdownReason::RunnerFailure { .. } => "runner_failure",
            ShutdownReason::AllCompleted => "all_completed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::ExternalSignal { source } => write!(f, "external signal {source}"),
            ShutdownReason::RunnerFailure { runner, error, .. } => {
                write!(f, "runner {runner:?} failed: {error}")
            }
            ShutdownReason::AllCompleted => f.write_str("all runners completed"),
        }
    }
}

/// The run stopped waiting before every runner returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Forced {
    /// The shutdown timeout elapsed.
    Deadline {
        /// The configured shutdown timeout.
        timeout: Duration,
        /// Runners still running at that point.
        stuck: Vec<Arc<str>>,
    },
    /// A repeated external request arrived while draining.
    Escalated {
        /// Label of the request.
        by: Arc<str>,
        /// Runners still running at that point.
        stuck: Vec<Arc<str>>,
    },
}

impl Forced {
    /// Names of the runners that were left running.
    pub fn stuck(&self) -> &[Arc<str>] {
        match self {
            Forced::Deadline { stuck, .. } | Forced::Escalated { stuck, .. } => stuck,
        }
    }
}

/// What happened to the cleanup hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// No hook was configured.
    Skipped,
    /// The hook returned `Ok(())`.
    Completed,
    /// The hook failed, timed out, or panicked.
    Failed(CleanupError),
}

impl CleanupOutcome {
    /// `true` if the hook was invoked.
    pub fn was_invoked(&self) -> bool {
        !matches!(self, CleanupOutcome::Skipped)
    }

    /// The hook's error, if any.
    pub fn error(&self) -> Option<&CleanupError> {
        match self {
            CleanupOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// A runner failure observed after the shutdown reason was fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressedFailure {
    /// Name of the failing runner.
    pub runner: Arc<str>,
    /// Position of the runner in the input list.
    pub index: usize,
    /// The error it returned.
    pub error: RunnerError,
}

/// Process-level classification of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    /// Clean completion or signal-driven stop.
    Success,
    /// A runner or the cleanup hook failed.
    Failed,
    /// Runners did not stop in time.
    Forced,
}

impl ExitStatus {
    /// Conventional process exit code: `0`, `1`, `2`.
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failed => 1,
            ExitStatus::Forced => 2,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            ExitStatus::Success => "success",
            ExitStatus::Failed => "failed",
            ExitStatus::Forced => "forced",
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Everything observed during one orchestration run.
#[derive(Debug, Clone)]
pub struct Report {
    /// First shutdown trigger.
    pub reason: ShutdownReason,
    /// Set when waiting on runners stopped early.
    pub forced: Option<Forced>,
    /// Cleanup hook result.
    pub cleanup: CleanupOutcome,
    /// Runner failures after the reason was fixed, in arrival order.
    pub suppressed: Vec<SuppressedFailure>,
    /// Wall time from start to the end of cleanup.
    pub elapsed: Duration,
}

impl Report {
    /// The single top-level error of the run, if any.
    pub fn error(&self) -> Option<RuntimeError> {
        if let Some(forced) = &self.forced {
            let reason = self.reason.clone();
            return Some(match forced {
                Forced::Deadline { timeout, stuck } => RuntimeError::DeadlineExceeded {
                    timeout: *timeout,
                    stuck: stuck.clone(),
                    reason,
                },
                Forced::Escalated { by, stuck } => RuntimeError::Escalated {
                    by: by.clone(),
                    stuck: stuck.clone(),
                    reason,
                },
            });
        }
        if let ShutdownReason::RunnerFailure { runner, error, .. } = &self.reason {
            return Some(RuntimeError::RunnerFailed {
                runner: runner.clone(),
                source: error.clone(),
            });
        }
        if let Some(first) = self.suppressed.first() {
            return Some(RuntimeError::RunnerFailed {
                runner: first.runner.clone(),
                source: first.error.clone(),
            });
        }
        self.cleanup
            .error()
            .map(|source| RuntimeError::CleanupFailed {
                source: source.clone(),
            })
    }

    /// Classification for the process exit status.
    pub fn status(&self) -> ExitStatus {
        match self.error() {
            None => ExitStatus::Success,
            Some(e) if e.is_forced() => ExitStatus::Forced,
            Some(_) => ExitStatus::Failed,
        }
    }

    /// `true` when the run ended without any surfaced error.
    pub fn is_success(&self) -> bool {
        self.status() == ExitStatus::Success
    }

    /// Converts the report into `Result`, dropping the diagnostic details.
    pub fn into_result(self) -> Result<(), RuntimeError> {
        match self.error() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(reason: ShutdownReason) -> Report {
        Report {
            reason,
            forced: None,
            cleanup: CleanupOutcome::Completed,
            suppressed: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    fn failure() -> ShutdownReason {
        ShutdownReason::RunnerFailure {
            runner: "db".into(),
            index: 0,
            error: RunnerError::fail("boom"),
        }
    }

    #[test]
    fn test_signal_stop_is_success() {
        let r = report(ShutdownReason::ExternalSignal {
            source: "SIGTERM".into(),
        });
        assert!(r.error().is_none());
        assert_eq!(r.status(), ExitStatus::Success);
        assert!(r.into_result().is_ok());
    }

    #[test]
    fn test_forced_overrides_runner_failure() {
        let mut r = report(failure());
        r.forced = Some(Forced::Deadline {
            timeout: Duration::from_secs(1),
            stuck: vec!["slow".into()],
        });
        r.cleanup = CleanupOutcome::Failed(CleanupError::fail("disk"));

        match r.error() {
            Some(RuntimeError::DeadlineExceeded { stuck, reason, .. }) => {
                assert_eq!(stuck, vec![Arc::<str>::from("slow")]);
                assert_eq!(reason, failure());
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(r.status(), ExitStatus::Forced);
        assert_eq!(r.status().code(), 2);
    }

    #[test]
    fn test_runner_failure_overrides_cleanup_but_keeps_it() {
        let mut r = report(failure());
        r.cleanup = CleanupOutcome::Failed(CleanupError::fail("disk"));

        assert!(matches!(
            r.error(),
            Some(RuntimeError::RunnerFailed { ref runner, .. }) if &**runner == "db"
        ));
        assert_eq!(r.cleanup.error(), Some(&CleanupError::fail("disk")));
        assert_eq!(r.status(), ExitStatus::Failed);
    }

    #[test]
    fn test_drain_failure_after_signal_fails_the_run() {
        let mut r = report(ShutdownReason::ExternalSignal {
            source: "SIGTERM".into(),
        });
        r.cleanup = CleanupOutcome::Failed(CleanupError::fail("disk"));
        r.suppressed = vec![
            SuppressedFailure {
                runner: "db".into(),
                index: 0,
                error: RunnerError::fail("flush failed"),
            },
            SuppressedFailure {
                runner: "cache".into(),
                index: 1,
                error: RunnerError::fail("late"),
            },
        ];

        match r.error() {
            Some(RuntimeError::RunnerFailed { runner, source }) => {
                assert_eq!(&*runner, "db");
                assert_eq!(source, RunnerError::fail("flush failed"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(r.status(), ExitStatus::Failed);
    }

    #[test]
    fn test_first_failure_stays_surfaced_over_suppressed() {
        let mut r = report(failure());
        r.suppressed = vec![SuppressedFailure {
            runner: "cache".into(),
            index: 1,
            error: RunnerError::fail("late"),
        }];
        assert!(matches!(
            r.error(),
            Some(RuntimeError::RunnerFailed { ref runner, .. }) if &**runner == "db"
        ));
    }

    #[test]
    fn test_cleanup_failure_alone_fails_the_run() {
        let mut r = report(ShutdownReason::AllCompleted);
        r.cleanup = CleanupOutcome::Failed(CleanupError::fail("disk"));
        assert!(matches!(r.error(), Some(RuntimeError::CleanupFailed { .. })));
        assert_eq!(r.status().code(), 1);
    }

    #[test]
    fn test_reason_display_and_labels() {
        assert_eq!(failure().to_string(), "runner \"db\" failed: execution failed: boom");
        assert_eq!(failure().as_label(), "runner_failure");
        assert_eq!(ShutdownReason::AllCompleted.as_label(), "all_completed");
        assert_eq!(ExitStatus::Forced.as_label(), "forced");
    }
}
