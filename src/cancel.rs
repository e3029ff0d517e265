//! # Cancellation: owner/observer split over a broadcast token.
//!
//! The orchestrator cancels; runners observe. [`CancelSource`] is the only type
//! that can cancel, [`CancelSignal`] is the read-only handle passed to runners
//! and to the cleanup hook.
//!
//! ```text
//! CancelSource ──cancel()──► CancellationToken ──► CancelSignal (runner 1)
//!      │                            │         └──► CancelSignal (runner 2)
//!      └─ deadline (optional) ──────┘         └──► CancelSignal (runner N)
//! ```
//!
//! ## Rules
//! - Cancellation is one-way and idempotent: once signaled, stays signaled.
//! - A signal with a deadline also counts as cancelled once the deadline is reached.
//! - [`CancelSignal::child_source`] derives a nested scope: cancelling the child
//!   never affects the parent, cancelling the parent always reaches the child.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// Owning side of a cancellation scope.
#[derive(Debug, Default)]
pub struct CancelSource {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelSource {
    /// Creates a new scope without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new scope that reports cancelled after `timeout` elapses.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Cancels the scope. Calling it again is a no-op.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.signal().is_cancelled()
    }

    /// Returns a read-only observer of this scope.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            token: self.token.clone(),
            deadline: self.deadline,
        }
    }
}

/// Read-only observer of a cancellation scope.
///
/// Cheap to clone; every clone observes the same transition.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// Returns `true` if the scope was cancelled or its deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Completes when the scope is cancelled or its deadline is reached.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Deadline attached to this scope, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline (`None` = unbounded, `Some(ZERO)` = expired).
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Drives `fut` until it completes or the scope is cancelled.
    ///
    /// Returns `None` when cancellation won; `fut` is dropped in that case.
    pub async fn run_until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = fut => Some(out),
        }
    }

    /// Derives a nested scope bound to this one.
    ///
    /// The child keeps the parent's deadline.
    pub fn child_source(&self) -> CancelSource {
        CancelSource {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }
}
