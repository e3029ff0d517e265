//! # Orchestrator configuration.
//!
//! Provides [`Config`], the timing knobs and signal policy used by
//! [`Orchestrator`](crate::Orchestrator). Both timeouts are supplied by the
//! embedding program; nothing is computed internally.
//!
//! ## Sentinel values
//! - `shutdown_timeout = 0s` → do not wait after cancellation; any runner still
//!   running at that point makes the shutdown forced.

use std::time::Duration;

/// Configuration for one orchestration run.
///
/// ## Field semantics
/// - `shutdown_timeout`: Maximum wait for runners after cancellation is issued
/// - `cleanup_timeout`: Deadline of the context handed to the cleanup hook
/// - `os_signals`: Listen for SIGINT/SIGTERM/SIGQUIT (Ctrl-C off Unix)
/// - `escalate_on_second_signal`: A second external request during shutdown stops waiting at once
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time between cancellation and giving up on stragglers.
    ///
    /// When exceeded the run ends with `RuntimeError::DeadlineExceeded`.
    /// The stragglers are not aborted, only no longer awaited.
    pub shutdown_timeout: Duration,

    /// Bound of the context passed to the cleanup hook.
    ///
    /// The orchestrator also stops waiting for the hook once it elapses.
    pub cleanup_timeout: Duration,

    /// Whether OS termination signals count as an external shutdown trigger.
    pub os_signals: bool,

    /// Whether a second external request during shutdown forces it.
    ///
    /// - `false` = the signal listener stops after the first request
    /// - `true` = the listener keeps running; the next request ends the drain
    pub escalate_on_second_signal: bool,
}

impl Config {
    /// Returns `true` if the orchestrator should not wait at all after cancelling.
    #[inline]
    pub fn is_immediate_shutdown(&self) -> bool {
        self.shutdown_timeout == Duration::ZERO
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `shutdown_timeout = 15s`
    /// - `cleanup_timeout = 15s`
    /// - `os_signals = true`
    /// - `escalate_on_second_signal = false`
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(15),
            cleanup_timeout: Duration::from_secs(15),
            os_signals: true,
            escalate_on_second_signal: false,
        }
    }
}
