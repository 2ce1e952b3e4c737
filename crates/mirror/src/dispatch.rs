//! Inbound event queue and per-message sequencing.
//!
//! The platform handler pushes [`MirrorEvent`]s into a bounded queue. One
//! dispatch loop drains it and routes each event to a lane keyed by
//! [`MirrorEvent::key`]. Lanes run concurrently with each other; events inside
//! a lane run strictly in arrival order. A lane task exits once its queue is
//! empty and is recreated on the next event for that key. Lane tasks are
//! tracked, and [`EventDispatcher::run`] returns only after all of them end.

use std::sync::Arc;

use {
    dashmap::{DashMap, mapref::entry::Entry},
    tokio::sync::mpsc,
    tokio_util::{sync::CancellationToken, task::TaskTracker},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use dmbridge_metrics::{gauge, mirror as mirror_metrics};

use crate::{engine::SyncEngine, types::MirrorEvent};

/// Default capacity of the inbound queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Producer side of the inbound queue, held by the platform handler.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<MirrorEvent>,
}

impl EventSender {
    /// Enqueue an event. Returns `false` if the dispatcher has shut down.
    pub async fn send(&self, event: MirrorEvent) -> bool {
        match self.tx.send(event).await {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                warn!(
                    kind = event.kind(),
                    key = event.key(),
                    "dispatcher closed, dropping event"
                );
                false
            },
        }
    }
}

struct Inner {
    engine: Arc<SyncEngine>,
    lanes: DashMap<String, mpsc::UnboundedSender<MirrorEvent>>,
    tracker: TaskTracker,
}

/// Consumer side of the inbound queue.
pub struct EventDispatcher {
    inner: Arc<Inner>,
    rx: mpsc::Receiver<MirrorEvent>,
}

impl EventDispatcher {
    pub fn new(engine: Arc<SyncEngine>, capacity: usize) -> (EventSender, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let dispatcher = Self {
            inner: Arc::new(Inner {
                engine,
                lanes: DashMap::new(),
                tracker: TaskTracker::new(),
            }),
            rx,
        };
        (EventSender { tx }, dispatcher)
    }

    /// Number of keys with events currently queued or in flight.
    pub fn active_lanes(&self) -> usize {
        self.inner.lanes.len()
    }

    /// Drain the queue until every sender is dropped or `cancel` fires, then
    /// wait for every lane to settle.
    ///
    /// Lanes already running finish their queued events; nothing new is
    /// accepted after cancellation.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("mirror dispatcher started");
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("mirror dispatcher cancelled");
                    break;
                },
                event = self.rx.recv() => event,
            };
            let Some(event) = event else {
                info!("mirror event queue closed");
                break;
            };
            debug!(kind = event.kind(), key = event.key(), "routing event");
            Inner::route(&self.inner, event);
        }

        self.inner.tracker.close();
        let pending = self.inner.lanes.len();
        if pending > 0 {
            info!(lanes = pending, "waiting for in-flight events");
        }
        self.inner.tracker.wait().await;
        info!("mirror dispatcher stopped");
    }
}

impl Inner {
    fn route(this: &Arc<Self>, event: MirrorEvent) {
        let key = event.key().to_string();
        match this.lanes.entry(key.clone()) {
            Entry::Occupied(lane) => {
                // The lane only retires under this same shard lock, so its
                // receiver is still alive here.
                if lane.get().send(event).is_err() {
                    warn!(key = %key, "lane closed unexpectedly, dropping event");
                }
            },
            Entry::Vacant(slot) => {
                let (tx, rx) = mpsc::unbounded_channel();
                if let Err(mpsc::error::SendError(event)) = tx.send(event) {
                    warn!(
                        key = %key,
                        kind = event.kind(),
                        "new lane rejected event, dropping"
                    );
                    return;
                }
                slot.insert(tx);
                #[cfg(feature = "metrics")]
                gauge!(mirror_metrics::ACTIVE_LANES).increment(1.0);
                this.tracker.spawn(Self::drain(Arc::clone(this), key, rx));
            },
        }
    }

    async fn drain(this: Arc<Self>, key: String, mut rx: mpsc::UnboundedReceiver<MirrorEvent>) {
        loop {
            match rx.try_recv() {
                Ok(event) => this.engine.handle(event).await,
                Err(_) => {
                    // Retire only if nothing arrived since the last check; the
                    // check and removal happen under the shard lock `route` uses.
                    if this.lanes.remove_if(&key, |_, _| rx.is_empty()).is_some() {
                        #[cfg(feature = "metrics")]
                        gauge!(mirror_metrics::ACTIVE_LANES).decrement(1.0);
                        break;
                    }
                },
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{EngineSettings, fakes::*, store::CorrelationStore, store_memory::InMemoryStore},
        std::time::Duration,
    };

    fn setup() -> (Arc<InMemoryStore>, Arc<FakeTransport>, Arc<SyncEngine>) {
        let store = Arc::new(InMemoryStore::new());
        let transport = Arc::new(FakeTransport::default());
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            transport.clone(),
            Arc::new(StaticGate(true)),
            EngineSettings::new(MIRROR_CHANNEL),
        ));
        (store, transport, engine)
    }

    #[tokio::test]
    async fn events_for_one_message_apply_in_order() {
        let (store, transport, engine) = setup();
        let (tx, dispatcher) = EventDispatcher::new(engine, 16);
        let inner = Arc::clone(&dispatcher.inner);
        let handle = tokio::spawn(dispatcher.run(CancellationToken::new()));

        assert!(tx.send(MirrorEvent::Created(create("m1", "alice", "v1"))).await);
        assert!(tx.send(MirrorEvent::Edited(edit("m1", "alice", "v2"))).await);
        assert!(tx.send(MirrorEvent::Edited(edit("m1", "alice", "v3"))).await);
        assert!(tx.send(MirrorEvent::Deleted(delete("m1", "alice"))).await);

        // Closing the queue lets the loop exit once everything is applied.
        drop(tx);
        handle.await.unwrap();
        assert_eq!(inner.lanes.len(), 0);

        assert_eq!(transport.calls(), vec![
            "send".to_string(),
            "edit:x1".to_string(),
            "edit:x1".to_string(),
            "delete:x1".to_string(),
        ]);
        assert!(store.get_by_original_id("m1").await.unwrap().is_none());
        // Two edit confirmations and one delete confirmation.
        assert_eq!(transport.notices().len(), 3);
    }

    #[tokio::test]
    async fn distinct_messages_all_settle() {
        let (store, transport, engine) = setup();
        let (tx, dispatcher) = EventDispatcher::new(engine, 4);
        let inner = Arc::clone(&dispatcher.inner);
        let handle = tokio::spawn(dispatcher.run(CancellationToken::new()));

        for i in 0..20 {
            let id = format!("m{i}");
            assert!(tx.send(MirrorEvent::Created(create(&id, "alice", "hi"))).await);
        }
        drop(tx);
        handle.await.unwrap();
        assert_eq!(inner.lanes.len(), 0);

        assert_eq!(store.len(), 20);
        assert_eq!(transport.count("send"), 20);
    }

    #[tokio::test]
    async fn run_returns_after_slow_lanes_settle() {
        let (store, transport, engine) = setup();
        transport.set_send_delay(Duration::from_millis(200));
        let (tx, dispatcher) = EventDispatcher::new(engine, 8);
        let inner = Arc::clone(&dispatcher.inner);
        let handle = tokio::spawn(dispatcher.run(CancellationToken::new()));

        for id in ["m1", "m2", "m3"] {
            assert!(tx.send(MirrorEvent::Created(create(id, "alice", "hi"))).await);
        }
        drop(tx);
        handle.await.unwrap();

        // No waiting here: `run` itself covers the in-flight sends.
        assert_eq!(inner.lanes.len(), 0);
        assert_eq!(transport.count("send"), 3);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn cancelled_run_still_finishes_routed_events() {
        let (store, transport, engine) = setup();
        transport.set_send_delay(Duration::from_millis(100));
        let (tx, dispatcher) = EventDispatcher::new(engine, 8);
        let inner = Arc::clone(&dispatcher.inner);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(dispatcher.run(cancel.clone()));

        assert!(tx.send(MirrorEvent::Created(create("m1", "alice", "hi"))).await);
        // Cancel only once the event sits in its lane.
        while inner.lanes.is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(inner.lanes.len(), 0);
        assert_eq!(transport.count("send"), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn send_after_shutdown_reports_false() {
        let (_, _, engine) = setup();
        let (tx, dispatcher) = EventDispatcher::new(engine, 1);
        let cancel = CancellationToken::new();
        cancel.cancel();
        dispatcher.run(cancel).await;

        assert!(!tx.send(MirrorEvent::Created(create("m1", "alice", "hi"))).await);
    }
}
