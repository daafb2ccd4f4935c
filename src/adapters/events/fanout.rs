//! Fan-out event bus.
//!
//! Every subscriber gets its own bounded queue drained by its own task.
//! `publish` only ever does `try_send`, so it never blocks and a stalled
//! listener can only lose its own events.

use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::events::GatewayEvent;
use crate::ports::{EventListener, EventPublisher, EventSubscriber, Subscription, SubscriptionId};

/// Default per-listener queue depth.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

struct ListenerSlot {
    name: &'static str,
    tx: mpsc::Sender<GatewayEvent>,
}

/// Production event bus.
///
/// `subscribe` spawns a task and therefore must run inside a Tokio runtime.
pub struct FanoutEventBus {
    listeners: RwLock<HashMap<SubscriptionId, ListenerSlot>>,
    capacity: usize,
}

impl FanoutEventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn listener_count(&self) -> usize {
        match self.listeners.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn spawn_worker(
        id: SubscriptionId,
        listener: Arc<dyn EventListener>,
        mut rx: mpsc::Receiver<GatewayEvent>,
    ) {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let event_id = event.event_id;
                let kind = event.kind;
                match AssertUnwindSafe(listener.handle(event)).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(
                            listener = listener.name(),
                            %event_id,
                            %kind,
                            error = %e,
                            "Event listener failed"
                        );
                    }
                    Err(_) => {
                        tracing::error!(
                            listener = listener.name(),
                            %event_id,
                            %kind,
                            "Event listener panicked, continuing with next event"
                        );
                    }
                }
            }
            tracing::debug!(listener = listener.name(), subscription = %id, "Listener worker stopped");
        });
    }
}

impl Default for FanoutEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl EventPublisher for FanoutEventBus {
    fn publish(&self, event: GatewayEvent) {
        let guard = match self.listeners.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        for (id, slot) in guard.iter() {
            match slot.tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(dropped)) => {
                    tracing::warn!(
                        listener = slot.name,
                        subscription = %id,
                        event_id = %dropped.event_id,
                        kind = %dropped.kind,
                        "Listener queue full, dropping event"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(listener = slot.name, subscription = %id, "Listener queue closed");
                }
            }
        }
    }
}

impl EventSubscriber for FanoutEventBus {
    fn subscribe(&self, listener: Arc<dyn EventListener>) -> Subscription {
        let id = SubscriptionId::new();
        let name = listener.name();
        let (tx, rx) = mpsc::channel(self.capacity);

        Self::spawn_worker(id, listener, rx);

        let mut guard = match self.listeners.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(id, ListenerSlot { name, tx });

        tracing::info!(listener = name, subscription = %id, "Listener subscribed");
        Subscription { id, listener: name }
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut guard = match self.listeners.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Dropping the sender lets the worker drain its queue and exit.
        match guard.remove(&id) {
            Some(slot) => {
                tracing::info!(listener = slot.name, subscription = %id, "Listener unsubscribed");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainError, ErrorCode, InstanceKey};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn event(code: &str) -> GatewayEvent {
        GatewayEvent::qr_update(InstanceKey::new("sales").unwrap(), code)
    }

    struct Collecting {
        seen: Mutex<Vec<String>>,
        notify: Notify,
    }

    impl Collecting {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                notify: Notify::new(),
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }

        async fn wait_for(&self, n: usize) {
            tokio::time::timeout(Duration::from_secs(2), async {
                while self.seen().len() < n {
                    self.notify.notified().await;
                }
            })
            .await
            .expect("listener did not receive events in time");
        }
    }

    #[async_trait]
    impl EventListener for Collecting {
        async fn handle(&self, event: GatewayEvent) -> Result<(), DomainError> {
            let code = event.payload["qrcode"].as_str().unwrap_or_default().to_string();
            self.seen.lock().unwrap().push(code);
            self.notify.notify_one();
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Collecting"
        }
    }

    struct Failing;

    #[async_trait]
    impl EventListener for Failing {
        async fn handle(&self, _event: GatewayEvent) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::InternalError, "nope"))
        }

        fn name(&self) -> &'static str {
            "Failing"
        }
    }

    struct Panicking;

    #[async_trait]
    impl EventListener for Panicking {
        async fn handle(&self, _event: GatewayEvent) -> Result<(), DomainError> {
            panic!("listener blew up");
        }

        fn name(&self) -> &'static str {
            "Panicking"
        }
    }

    struct Blocking {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl EventListener for Blocking {
        async fn handle(&self, _event: GatewayEvent) -> Result<(), DomainError> {
            self.release.notified().await;
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Blocking"
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let bus = FanoutEventBus::default();
        bus.publish(event("a"));
        assert_eq!(bus.listener_count(), 0);
    }

    #[tokio::test]
    async fn delivers_in_order_to_each_listener() {
        let bus = FanoutEventBus::default();
        let a = Collecting::new();
        let b = Collecting::new();
        bus.subscribe(a.clone());
        bus.subscribe(b.clone());

        for code in ["1", "2", "3"] {
            bus.publish(event(code));
        }

        a.wait_for(3).await;
        b.wait_for(3).await;
        assert_eq!(a.seen(), vec!["1", "2", "3"]);
        assert_eq!(b.seen(), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn failing_listener_does_not_block_another() {
        let bus = FanoutEventBus::default();
        let healthy = Collecting::new();
        bus.subscribe(Arc::new(Failing));
        bus.subscribe(Arc::new(Panicking));
        bus.subscribe(healthy.clone());

        bus.publish(event("1"));
        bus.publish(event("2"));

        healthy.wait_for(2).await;
        assert_eq!(healthy.seen(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn full_queue_drops_only_for_that_listener() {
        let bus = FanoutEventBus::new(1);
        let release = Arc::new(Notify::new());
        let healthy = Collecting::new();
        bus.subscribe(Arc::new(Blocking {
            release: release.clone(),
        }));
        bus.subscribe(healthy.clone());

        // Blocking holds one event in flight and one queued; the rest drop.
        for code in ["1", "2", "3", "4"] {
            bus.publish(event(code));
            tokio::task::yield_now().await;
            healthy.wait_for(code.parse().unwrap()).await;
        }

        assert_eq!(healthy.seen(), vec!["1", "2", "3", "4"]);
        release.notify_waiters();
    }

    #[tokio::test]
    async fn unsubscribed_listener_receives_nothing_new() {
        let bus = FanoutEventBus::default();
        let listener = Collecting::new();
        let sub = bus.subscribe(listener.clone());

        bus.publish(event("1"));
        listener.wait_for(1).await;

        assert!(bus.unsubscribe(sub.id));
        assert!(!bus.unsubscribe(sub.id));
        bus.publish(event("2"));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(listener.seen(), vec!["1"]);
        assert_eq!(bus.listener_count(), 0);
    }

    #[tokio::test]
    async fn subscription_carries_listener_name() {
        let bus = FanoutEventBus::default();
        let sub = bus.subscribe(Collecting::new());
        assert_eq!(sub.listener, "Collecting");
    }
}
