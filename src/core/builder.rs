use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::orchestrator::{ErrorHandler, Orchestrator, State};
use crate::{
    cleanup::CleanupRef,
    config::Config,
    error::RunnerError,
    runners::RunnerRef,
    subscribers::Subscribe,
};

/// Builder for an [`Orchestrator`].
///
/// Every collaborator is passed explicitly: runners, the cleanup hook, an
/// optional error handler, subscribers and the tracing span.
pub struct OrchestratorBuilder {
    cfg: Config,
    runners: Vec<RunnerRef>,
    cleanup: Option<CleanupRef>,
    error_handler: Option<ErrorHandler>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    span: Option<tracing::Span>,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            runners: Vec::new(),
            cleanup: None,
            error_handler: None,
            subscribers: Vec::new(),
            span: None,
        }
    }

    /// Appends one runner. Runners start in insertion order.
    pub fn with_runner(mut self, runner: RunnerRef) -> Self {
        self.runners.push(runner);
        self
    }

    /// Appends several runners.
    pub fn with_runners(mut self, runners: impl IntoIterator<Item = RunnerRef>) -> Self {
        self.runners.extend(runners);
        self
    }

    /// Sets the cleanup hook, replacing any previous one.
    pub fn with_cleanup(mut self, cleanup: CleanupRef) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// Sets the orchestrator-wide error handler.
    ///
    /// Called with the runner name and every error that survived
    /// [`Runner::handle_error`](crate::Runner::handle_error). Returning `None`
    /// absorbs the error; returning `Some` makes it a failure.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, RunnerError) -> Option<RunnerError> + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Sets event subscribers, replacing any added before.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Appends one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Runs the orchestration inside `span`, so all log lines carry its fields.
    ///
    /// Defaults to `info_span!("runvisor")`.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Builds the orchestrator in [`State::Idle`].
    ///
    /// Does not spawn anything; it is safe to call outside a tokio runtime.
    pub fn build(self) -> Orchestrator {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(State::Idle);

        Orchestrator {
            cfg: self.cfg,
            runners: self.runners,
            cleanup: self.cleanup,
            error_handler: self.error_handler,
            subscribers: self.subscribers,
            span: self
                .span
                .unwrap_or_else(|| tracing::info_span!("runvisor")),
            trigger_tx,
            trigger_rx,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelSignal;
    use crate::runners::RunnerFn;
    use crate::subscribers::LogWriter;

    #[test]
    fn test_build_outside_runtime_is_idle() {
        let noop = |_ctx: CancelSignal| async { Ok::<(), RunnerError>(()) };
        let orch = OrchestratorBuilder::new(Config::default())
            .with_runner(RunnerFn::arc("a", noop))
            .with_runners(vec![RunnerFn::arc("b", noop) as RunnerRef])
            .with_subscriber(Arc::new(LogWriter::new()))
            .build();

        assert_eq!(*orch.state().borrow(), State::Idle);
        assert_eq!(orch.runners.len(), 2);
        assert_eq!(orch.subscribers.len(), 1);
        assert!(orch.cleanup.is_none());
        assert!(orch.config().os_signals);
    }
}
