//! # External shutdown triggers.
//!
//! Two producers feed one channel of labelled requests:
//! - the OS-signal listener (spawned per run when [`Config::os_signals`](crate::Config::os_signals) is set)
//! - any number of [`ShutdownHandle`]s held by the embedding program
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for hard stop)
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! ## Rules
//! - Without escalation the listener translates the first signal and exits.
//! - The listener task is aborted when [`Triggers`] is dropped, which releases the
//!   signal subscriptions on every exit path of the run (panics included).

use std::io;
use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};

/// Requests an external shutdown of a running orchestrator.
///
/// Obtained from [`Orchestrator::shutdown_handle`](crate::Orchestrator::shutdown_handle).
/// Cloneable; requests from all clones and from OS signals are handled in arrival order.
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    tx: mpsc::UnboundedSender<Arc<str>>,
}

impl ShutdownHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Arc<str>>) -> Self {
        Self { tx }
    }

    /// Requests a shutdown labelled `source` (shows up in [`ShutdownReason::ExternalSignal`](crate::ShutdownReason)).
    ///
    /// Requests made before `run` starts are delivered as soon as it does.
    /// Returns `false` once the run has terminated.
    pub fn request(&self, source: impl Into<Arc<str>>) -> bool {
        self.tx.send(source.into()).is_ok()
    }
}

/// Receiving side of the trigger channel, owned by one run.
pub(crate) struct Triggers {
    rx: mpsc::UnboundedReceiver<Arc<str>>,
    listener: Option<ListenerGuard>,
}

impl Triggers {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Arc<str>>) -> Self {
        Self { rx, listener: None }
    }

    /// Registers the OS-signal handlers and spawns a listener forwarding into `tx`.
    ///
    /// Handlers are installed before this returns. With `repeat = false` the
    /// listener exits after the first signal. A registration failure is logged
    /// and leaves OS signals ignored.
    pub(crate) fn listen_os(&mut self, tx: mpsc::UnboundedSender<Arc<str>>, repeat: bool) {
        let signals = match OsSignals::register() {
            Ok(s) => s,
            Err(error) => {
                tracing::warn!(%error, "failed to register OS signal handlers; OS signals ignored");
                return;
            }
        };
        let handle = tokio::spawn(forward_os_signals(signals, tx, repeat));
        self.listener = Some(ListenerGuard(handle));
    }

    /// Next external request; `None` once every producer is gone.
    pub(crate) async fn next(&mut self) -> Option<Arc<str>> {
        self.rx.recv().await
    }

    /// Stops the listener and rejects further requests.
    pub(crate) fn close(&mut self) {
        self.listener.take();
        self.rx.close();
    }
}

/// Aborts the listener task when dropped.
struct ListenerGuard(JoinHandle<()>);

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn forward_os_signals(
    mut signals: OsSignals,
    tx: mpsc::UnboundedSender<Arc<str>>,
    repeat: bool,
) {
    loop {
        let name = match signals.recv().await {
            Ok(name) => name,
            Err(error) => {
                tracing::warn!(%error, "OS signal listener failed");
                return;
            }
        };
        tracing::debug!(signal = name, "termination signal received");
        if tx.send(Arc::from(name)).is_err() || !repeat {
            return;
        }
    }
}

#[cfg(unix)]
struct OsSignals {
    int: tokio::signal::unix::Signal,
    term: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            int: signal(SignalKind::interrupt())?,
            term: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    async fn recv(&mut self) -> io::Result<&'static str> {
        tokio::select! {
            Some(()) = self.int.recv() => Ok("SIGINT"),
            Some(()) = self.term.recv() => Ok("SIGTERM"),
            Some(()) = self.quit.recv() => Ok("SIGQUIT"),
            else => Err(io::Error::other("signal streams closed")),
        }
    }
}

#[cfg(not(unix))]
struct OsSignals;

#[cfg(not(unix))]
impl OsSignals {
    fn register() -> io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> io::Result<&'static str> {
        tokio::signal::ctrl_c().await.map(|()| "CTRL-C")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_requests_arrive_in_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut triggers = Triggers::new(rx);
        let handle = ShutdownHandle::new(tx);

        assert!(handle.request("first"));
        assert!(handle.clone().request("second"));
        assert_eq!(triggers.next().await.as_deref(), Some("first"));
        assert_eq!(triggers.next().await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_close_rejects_requests_and_drops_listener() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut triggers = Triggers::new(rx);
        triggers.listen_os(tx.clone(), false);
        let handle = ShutdownHandle::new(tx);

        triggers.close();
        assert!(triggers.listener.is_none());
        assert!(!handle.request("late"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_os_listener_forwards_first_signal_then_exits() {
        use std::time::Duration;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut triggers = Triggers::new(rx);
        triggers.listen_os(tx, false);

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let first = tokio::time::timeout(Duration::from_secs(5), triggers.next())
            .await
            .unwrap();
        assert_eq!(first.as_deref(), Some("SIGTERM"));

        // The listener held the only sender; its exit closes the channel.
        let after = tokio::time::timeout(Duration::from_secs(5), triggers.next())
            .await
            .unwrap();
        assert!(after.is_none());
    }

    #[tokio::test]
    async fn test_next_ends_when_producers_are_gone() {
        let (tx, rx) = mpsc::unbounded_channel::<Arc<str>>();
        let mut triggers = Triggers::new(rx);
        drop(tx);
        assert!(triggers.next().await.is_none());
    }
}
