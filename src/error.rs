//! Error types used by the runvisor orchestrator, runners and the cleanup hook.
//!
//! This module defines three enums:
//!
//! - [`RunnerError`]: terminal outcome of a single runner that did not succeed.
//! - [`CleanupError`]: failure of the post-shutdown cleanup hook.
//! - [`RuntimeError`]: the single top-level error surfaced by an orchestration run.
//!
//! All of them provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::ShutdownReason;

/// # Errors produced by the orchestration run as a whole.
///
/// At most one of these is surfaced per run; see [`Report::error`](crate::Report::error)
/// for the priority between them.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    /// A runner returned a failure and triggered the shutdown.
    #[error("runner {runner:?} failed: {source}")]
    RunnerFailed {
        /// Name of the failing runner.
        runner: Arc<str>,
        /// Error returned by the runner.
        source: RunnerError,
    },

    /// Runners did not stop within the shutdown timeout after cancellation.
    #[error("shutdown deadline {timeout:?} exceeded ({reason}); stuck: {stuck:?}")]
    DeadlineExceeded {
        /// The configured shutdown timeout.
        timeout: Duration,
        /// Names of runners that were still running when waiting stopped.
        stuck: Vec<Arc<str>>,
        /// What started the shutdown.
        reason: ShutdownReason,
    },

    /// A repeated external request cut the drain short.
    #[error("shutdown escalated by {by:?} ({reason}); stuck: {stuck:?}")]
    Escalated {
        /// Label of the request that escalated the shutdown.
        by: Arc<str>,
        /// Names of runners that were still running when waiting stopped.
        stuck: Vec<Arc<str>>,
        /// What started the shutdown.
        reason: ShutdownReason,
    },

    /// The cleanup hook failed while everything else succeeded.
    #[error("cleanup failed: {source}")]
    CleanupFailed {
        /// Error reported by the cleanup hook.
        source: CleanupError,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use runvisor::{RuntimeError, RunnerError};
    ///
    /// let err = RuntimeError::RunnerFailed {
    ///     runner: "db".into(),
    ///     source: RunnerError::fail("connection refused"),
    /// };
    /// assert_eq!(err.as_label(), "runtime_runner_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::RunnerFailed { .. } => "runtime_runner_failed",
            RuntimeError::DeadlineExceeded { .. } => "runtime_deadline_exceeded",
            RuntimeError::Escalated { .. } => "runtime_escalated",
            RuntimeError::CleanupFailed { .. } => "runtime_cleanup_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::RunnerFailed { runner, source } => {
                format!("runner={runner} {}", source.as_message())
            }
            RuntimeError::DeadlineExceeded { timeout, stuck, .. } => {
                format!("deadline exceeded after {timeout:?}; stuck runners={stuck:?}")
            }
            RuntimeError::Escalated { by, stuck, .. } => {
                format!("escalated by {by}; stuck runners={stuck:?}")
            }
            RuntimeError::CleanupFailed { source } => source.as_message(),
        }
    }

    /// `true` when the run stopped waiting on runners before they all returned.
    pub fn is_forced(&self) -> bool {
        matches!(
            self,
            RuntimeError::DeadlineExceeded { .. } | RuntimeError::Escalated { .. }
        )
    }
}

/// # Terminal outcome of a runner that did not succeed.
///
/// [`RunnerError::Canceled`] is the distinguished "stopped because asked to"
/// outcome and is never treated as a failure.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// Runner failed; the orchestrator shuts down its siblings.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Runner panicked; reported like a failure.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Runner observed cancellation and exited.
    #[error("context cancelled")]
    Canceled,
}

impl RunnerError {
    /// Builds a [`RunnerError::Fail`] from anything printable.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        RunnerError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunnerError::Fail { .. } => "runner_failed",
            RunnerError::Panicked { .. } => "runner_panicked",
            RunnerError::Canceled => "runner_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RunnerError::Fail { error } => format!("error: {error}"),
            RunnerError::Panicked { info } => format!("panic: {info}"),
            RunnerError::Canceled => "context cancelled".to_string(),
        }
    }

    /// `true` for the cancelled outcome, which never counts as a failure.
    ///
    /// # Example
    /// ```
    /// use runvisor::RunnerError;
    ///
    /// assert!(RunnerError::Canceled.is_canceled());
    /// assert!(!RunnerError::fail("boom").is_canceled());
    /// ```
    pub fn is_canceled(&self) -> bool {
        matches!(self, RunnerError::Canceled)
    }
}

/// # Failure of the cleanup hook.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CleanupError {
    /// The hook returned an error.
    #[error("cleanup failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The hook did not return within its own timeout.
    #[error("cleanup timed out after {timeout:?}")]
    Timeout {
        /// The configured cleanup timeout.
        timeout: Duration,
    },

    /// The hook panicked.
    #[error("cleanup panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl CleanupError {
    /// Builds a [`CleanupError::Fail`] from anything printable.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        CleanupError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CleanupError::Fail { .. } => "cleanup_failed",
            CleanupError::Timeout { .. } => "cleanup_timeout",
            CleanupError::Panicked { .. } => "cleanup_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CleanupError::Fail { error } => format!("cleanup error: {error}"),
            CleanupError::Timeout { timeout } => format!("cleanup timeout: {timeout:?}"),
            CleanupError::Panicked { info } => format!("cleanup panic: {info}"),
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_info(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
