//! # Closure-backed runner (`RunnerFn`)
//!
//! [`RunnerFn`] wraps a closure `F: Fn(CancelSignal) -> Fut`. The closure is
//! called once per run and the future it returns owns its own state.
//!
//! ## Example
//! ```rust
//! use runvisor::{CancelSignal, RunnerError, RunnerFn, RunnerRef};
//!
//! let r: RunnerRef = RunnerFn::arc("worker", |ctx: CancelSignal| async move {
//!     ctx.cancelled().await;
//!     Err::<(), _>(RunnerError::Canceled)
//! });
//!
//! assert_eq!(r.name(), "worker");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::cancel::CancelSignal;
use crate::error::RunnerError;
use crate::runners::runner::{BoxRunnerFuture, Runner};

/// Error hook attached with [`RunnerFn::with_error_handler`].
type ErrorHook = Box<dyn Fn(RunnerError) -> Result<(), RunnerError> + Send + Sync>;

/// Function-backed runner implementation.
pub struct RunnerFn<F> {
    name: Cow<'static, str>,
    f: F,
    on_error: Option<ErrorHook>,
}

impl<F> RunnerFn<F> {
    /// Creates a new function-backed runner.
    ///
    /// Prefer [`RunnerFn::arc`] when you immediately need a [`RunnerRef`](crate::RunnerRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            on_error: None,
        }
    }

    /// Creates the runner and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Attaches a [`Runner::handle_error`] implementation.
    pub fn with_error_handler<H>(mut self, handler: H) -> Self
    where
        H: Fn(RunnerError) -> Result<(), RunnerError> + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }
}

impl<F> fmt::Debug for RunnerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerFn")
            .field("name", &self.name)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<F, Fut> Runner for RunnerFn<F>
where
    F: Fn(CancelSignal) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RunnerError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: CancelSignal) -> BoxRunnerFuture {
        Box::pin((self.f)(ctx))
    }

    fn handle_error(&self, err: RunnerError) -> Result<(), RunnerError> {
        match &self.on_error {
            Some(hook) => hook(err),
            None => Err(err),
        }
    }
}
