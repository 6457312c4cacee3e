//! In-process event bridge.
//!
//! Delivers scan engine events to registered listeners as named,
//! asynchronous notifications. Each listener gets its own unbounded queue,
//! so emitting never blocks the engine. Listeners are released through the
//! [`Subscription`] handle returned at subscribe time.

use scandeck_protocol::{EngineEvent, EventChannel};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

/// Identifier of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

struct Listener {
    channel: EventChannel,
    tx: mpsc::UnboundedSender<EngineEvent>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<u64, Listener>,
}

/// Cloneable handle to the bridge. Clones share one listener registry.
#[derive(Clone, Default)]
pub struct EventBridge {
    registry: Arc<Mutex<Registry>>,
}

impl fmt::Debug for EventBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        f.debug_struct("EventBridge")
            .field("listeners", &registry.listeners.len())
            .finish()
    }
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener on `channel`.
    pub fn subscribe(&self, channel: EventChannel) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut registry = self.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.insert(id, Listener { channel, tx });
            id
        };
        debug!(listener = id, channel = %channel, "Listener added");

        Subscription {
            id: ListenerId(id),
            channel,
            bridge: self.clone(),
            rx,
            removed: false,
        }
    }

    /// Deliver `event` to every listener of its channel.
    ///
    /// Returns how many listeners received it. Listeners whose receiving
    /// side is gone are pruned.
    pub fn emit(&self, event: EngineEvent) -> usize {
        let channel = event.channel();
        let mut registry = self.lock();
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, listener) in registry.listeners.iter() {
            if listener.channel != channel {
                continue;
            }
            if listener.tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                closed.push(*id);
            }
        }
        for id in closed {
            registry.listeners.remove(&id);
        }

        if delivered == 0 {
            debug!(channel = %channel, "Event dropped, no listeners");
        }
        delivered
    }

    /// Decode and deliver a raw named event.
    pub fn emit_named(
        &self,
        name: &str,
        payload: serde_json::Value,
    ) -> scandeck_protocol::Result<usize> {
        let event = EngineEvent::decode(name, payload)?;
        Ok(self.emit(event))
    }

    pub fn listener_count(&self, channel: EventChannel) -> usize {
        self.lock()
            .listeners
            .values()
            .filter(|listener| listener.channel == channel)
            .count()
    }

    fn remove(&self, id: ListenerId) {
        if self.lock().listeners.remove(&id.0).is_some() {
            debug!(listener = id.0, "Listener removed");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A live listener registration.
///
/// Dropping the subscription unregisters it; [`Subscription::remove`] does
/// the same explicitly.
pub struct Subscription {
    id: ListenerId,
    channel: EventChannel,
    bridge: EventBridge,
    rx: mpsc::UnboundedReceiver<EngineEvent>,
    removed: bool,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn channel(&self) -> EventChannel {
        self.channel
    }

    /// Next event on this channel, in emission order.
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        self.rx.recv().await
    }

    /// Unregister the listener. Events already queued are discarded.
    pub fn remove(mut self) {
        self.unregister();
    }

    fn unregister(&mut self) {
        if !self.removed {
            self.removed = true;
            self.bridge.remove(self.id);
            self.rx.close();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unregister();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scandeck_protocol::{ScanFailurePayload, ScanSuccessPayload};
    use serde_json::json;

    fn success(data: &str) -> EngineEvent {
        EngineEvent::ScanSucceeded(ScanSuccessPayload {
            data: data.to_string(),
            symbology: "CODE128".to_string(),
            timestamp: "1700000000000".to_string(),
        })
    }

    #[tokio::test]
    async fn test_emit_reaches_matching_channel_only() {
        let bridge = EventBridge::new();
        let mut scans = bridge.subscribe(EventChannel::ScanSuccess);
        let mut failures = bridge.subscribe(EventChannel::ScanFailure);

        assert_eq!(bridge.emit(success("a")), 1);
        assert_eq!(
            bridge.emit(EngineEvent::ScanFailed(ScanFailurePayload(json!({"error": "Scan failed"})))),
            1
        );

        assert_eq!(scans.recv().await, Some(success("a")));
        assert!(matches!(failures.recv().await, Some(EngineEvent::ScanFailed(_))));
    }

    #[tokio::test]
    async fn test_every_listener_receives_event() {
        let bridge = EventBridge::new();
        let mut first = bridge.subscribe(EventChannel::ScanSuccess);
        let mut second = bridge.subscribe(EventChannel::ScanSuccess);

        assert_eq!(bridge.emit(success("x")), 2);
        assert_eq!(first.recv().await, Some(success("x")));
        assert_eq!(second.recv().await, Some(success("x")));
    }

    #[test]
    fn test_remove_unregisters_listener() {
        let bridge = EventBridge::new();
        let sub = bridge.subscribe(EventChannel::ScanSuccess);
        assert_eq!(bridge.listener_count(EventChannel::ScanSuccess), 1);

        sub.remove();
        assert_eq!(bridge.listener_count(EventChannel::ScanSuccess), 0);
        assert_eq!(bridge.emit(success("late")), 0);
    }

    #[test]
    fn test_drop_unregisters_listener() {
        let bridge = EventBridge::new();
        {
            let _sub = bridge.subscribe(EventChannel::ScanFailure);
            assert_eq!(bridge.listener_count(EventChannel::ScanFailure), 1);
        }
        assert_eq!(bridge.listener_count(EventChannel::ScanFailure), 0);
    }

    #[test]
    fn test_listener_ids_are_unique() {
        let bridge = EventBridge::new();
        let a = bridge.subscribe(EventChannel::ScanSuccess);
        let b = bridge.subscribe(EventChannel::ScanSuccess);
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_emit_named_decodes_payload() {
        let bridge = EventBridge::new();
        let mut scans = bridge.subscribe(EventChannel::ScanSuccess);

        let delivered = bridge
            .emit_named(
                "onBarcodeScanned",
                json!({"data": "a", "symbology": "CODE128", "timestamp": "1700000000000"}),
            )
            .unwrap();
        assert_eq!(delivered, 1);
        assert_eq!(scans.recv().await, Some(success("a")));

        assert!(bridge.emit_named("onSomethingElse", json!({})).is_err());
    }
}
