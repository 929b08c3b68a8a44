use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// 1: PTY interceptor, 2: shell hooks, 3: process scanner,
/// 4: filesystem watcher, 5: health monitor.
pub type LayerId = u8;

pub const LAYER_PTY: LayerId = 1;
pub const LAYER_SHELL_HOOK: LayerId = 2;
pub const LAYER_PROCESS_MONITOR: LayerId = 3;
pub const LAYER_FS_WATCHER: LayerId = 4;
pub const LAYER_HEALTH_MONITOR: LayerId = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Heartbeat,
    LlmStart,
    LlmEnd,
    FsCreate,
    FsWrite,
    FsRemove,
    HookInstalled,
}

/// The unit of traffic on the event bus. Immutable once published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerEvent {
    pub kind: EventKind,
    pub layer: LayerId,
    pub tab_id: Option<String>,
    pub conversation_id: Option<String>,
    pub provider: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

impl LayerEvent {
    pub fn new(kind: EventKind, layer: LayerId) -> Self {
        Self {
            kind,
            layer,
            tab_id: None,
            conversation_id: None,
            provider: None,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_tab_id(mut self, tab_id: impl Into<String>) -> Self {
        self.tab_id = Some(tab_id.into());
        self
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

const DEFAULT_CAPACITY: usize = 1024;

/// In-process publish/subscribe bus for layer events and heartbeats.
///
/// Backed by a bounded broadcast channel: a subscriber that falls behind
/// loses events (it never blocks the publisher, and other subscribers are
/// unaffected). Publishing after every subscriber has dropped is a no-op.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LayerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Non-blocking. If there are no subscribers the event is simply dropped.
    pub fn publish(&self, event: LayerEvent) {
        // `send` only errors when there are zero receivers; that's a
        // silent no-op by design, not a bus failure.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LayerEvent> {
        self.tx.subscribe()
    }

    /// Spawn a task that invokes `handler` for every subsequent event.
    /// Lag (a slow handler) surfaces as a dropped-events log line, not a panic.
    pub fn subscribe_with_handler<F>(&self, name: &'static str, mut handler: F)
    where
        F: FnMut(LayerEvent) + Send + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => handler(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(subscriber = name, skipped = n, "event bus subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_before_subscribe_is_silently_dropped() {
        let bus = EventBus::new();
        bus.publish(LayerEvent::new(EventKind::Heartbeat, LAYER_HEALTH_MONITOR));
        // no panic, no subscriber to observe it
    }

    #[tokio::test]
    async fn subscriber_receives_events_in_publish_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(LayerEvent::new(EventKind::LlmStart, LAYER_PTY).with_tab_id("t1"));
        bus.publish(LayerEvent::new(EventKind::LlmEnd, LAYER_PTY).with_tab_id("t1"));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.kind, EventKind::LlmStart);
        assert_eq!(second.kind, EventKind::LlmEnd);
    }

    #[tokio::test]
    async fn lagging_subscriber_does_not_block_publisher_or_other_subscribers() {
        let bus = EventBus::with_capacity(2);
        let mut slow = bus.subscribe();
        let mut fast = bus.subscribe();

        for _ in 0..10 {
            bus.publish(LayerEvent::new(EventKind::Heartbeat, LAYER_FS_WATCHER));
        }

        // The fast subscriber still gets an Ok or a well-defined Lagged error,
        // never a hang.
        let _ = fast.recv().await;
        let _ = slow.recv().await;
    }
}
