//! In-process fan-out for mutation events.
//!
//! A broadcast topic that tolerates having nobody listening: publishing to
//! zero subscribers is a non-event, and a slow subscriber simply loses
//! messages. Nothing in the primary request path depends on delivery.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    ContactReceived {
        id: Uuid,
        name: String,
        subject: String,
    },
    ChatMessage {
        session_id: String,
        category: String,
    },
    ProjectChanged {
        id: Uuid,
    },
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Fire-and-forget; the error for "no receivers" is deliberately ignored.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
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

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.publish(AppEvent::ProjectChanged { id: Uuid::new_v4() });
    }

    #[tokio::test]
    async fn subscribers_observe_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(AppEvent::ChatMessage {
            session_id: "s1".into(),
            category: "greeting".into(),
        });

        let event = rx.recv().await.expect("event");
        assert!(matches!(event, AppEvent::ChatMessage { .. }));
    }
}
