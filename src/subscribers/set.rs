//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`] to every subscriber
//! **without awaiting** their processing.
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` uses `try_send` and returns immediately
//! - **Per-subscriber FIFO**: each subscriber sees events in emit order
//! - **Overflow**: event dropped for that subscriber only, logged with `tracing::warn!`
//! - **Isolation**: a panicking subscriber is logged and keeps receiving events
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber panics while holding a lock.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::panic_info;
use crate::events::Event;

use super::Subscribe;

/// Per-subscriber channel with metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out with per-subscriber bounded queues and worker tasks.
#[derive(Default)]
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called inside a tokio runtime. Minimum queue capacity is 1.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        tracing::warn!(
                            subscriber = name,
                            seq = ev.seq,
                            panic = %panic_info(&*payload),
                            "subscriber panicked"
                        );
                    }
                }
            });
            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }
        Self { channels, workers }
    }

    /// Number of subscribers in the set.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// `true` if the set has no subscribers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: Event) {
        if self.channels.is_empty() {
            return;
        }
        let event = Arc::new(event);
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = channel.name, seq = event.seq, "subscriber queue full; event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(subscriber = channel.name, seq = event.seq, "subscriber worker closed; event dropped");
                }
            }
        }
    }

    /// Closes all queues and waits up to `within` for workers to drain them.
    ///
    /// Workers still busy after `within` are left running detached.
    pub async fn shutdown(self, within: Duration) {
        drop(self.channels);

        let drain = async {
            for h in self.workers {
                let _ = h.await;
            }
        };
        if tokio::time::timeout(within, drain).await.is_err() {
            tracing::warn!(?within, "subscriber flush timed out");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().unwrap().push(ev.kind);
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, ev: &Event) {
            if ev.kind == EventKind::RunStarted {
                panic!("boom");
            }
        }
    }

    #[tokio::test]
    async fn test_fan_out_preserves_order_and_flushes() {
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![rec.clone(), Arc::new(Panicky)]);
        assert_eq!(set.len(), 2);

        set.emit(Event::new(EventKind::RunStarted));
        set.emit(Event::new(EventKind::ShutdownTriggered));
        set.emit(Event::new(EventKind::RunTerminated));
        set.shutdown(Duration::from_secs(1)).await;

        assert_eq!(
            *rec.seen.lock().unwrap(),
            vec![
                EventKind::RunStarted,
                EventKind::ShutdownTriggered,
                EventKind::RunTerminated
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_set_is_noop() {
        let set = SubscriberSet::default();
        assert!(set.is_empty());
        set.emit(Event::new(EventKind::RunStarted));
        set.shutdown(Duration::from_millis(10)).await;
    }
}
