use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::cleanup::Cleanup;
use crate::error::CleanupError;

/// Closure-backed cleanup hook.
///
/// ```rust
/// use runvisor::{CancelSignal, CleanupError, CleanupFn, CleanupRef};
///
/// let hook: CleanupRef = CleanupFn::arc(|_ctx: CancelSignal| async {
///     // close pools...
///     Ok::<_, CleanupError>(())
/// });
/// ```
pub struct CleanupFn<F> {
    f: F,
}

impl<F> CleanupFn<F> {
    /// Creates a new function-backed cleanup hook.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the hook and returns it as a shared [`CleanupRef`](crate::CleanupRef).
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F> fmt::Debug for CleanupFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CleanupFn")
    }
}

#[async_trait]
impl<F, Fut> Cleanup for CleanupFn<F>
where
    F: Fn(CancelSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CleanupError>> + Send + 'static,
{
    async fn cleanup(&self, ctx: CancelSignal) -> Result<(), CleanupError> {
        (self.f)(ctx).await
    }
}
