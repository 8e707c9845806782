//! Notification Channel Adapters
//!
//! Implements `NotificationChannel` on top of the shared event bus.

use crate::error::{TwinError, TwinResult};
use crate::ports::NotificationChannel;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_bus::{EventPublisher, InMemoryEventBus, TwinEvent};
use shared_types::Notification;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Event bus adapter for outcome notifications.
///
/// Publishes `OutcomeAnnounced` events for any observer subscribed to the
/// outcome topic.
pub struct EventBusNotifier {
    event_bus: Arc<InMemoryEventBus>,
}

impl EventBusNotifier {
    /// Create a new adapter with the given event bus.
    pub fn new(event_bus: Arc<InMemoryEventBus>) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl NotificationChannel for EventBusNotifier {
    async fn publish(&self, notification: Notification) -> TwinResult<()> {
        let topic = notification.topic.clone();
        let receivers = self
            .event_bus
            .publish(TwinEvent::OutcomeAnnounced(notification))
            .await;

        if receivers == 0 {
            // Nobody observing outcomes yet
            debug!(topic = %topic, "No outcome observers");
        }

        Ok(())
    }
}

/// In-memory channel for testing.
#[derive(Default)]
pub struct RecordingNotifier {
    published: RwLock<Vec<Notification>>,
    failing: AtomicBool,
    attempts: AtomicUsize,
}

impl RecordingNotifier {
    /// Create a new recording channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications successfully published so far.
    pub fn published(&self) -> Vec<Notification> {
        self.published.read().clone()
    }

    /// Make subsequent publishes fail (or succeed again).
    pub fn fail_publishes(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    /// Publish calls made, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationChannel for RecordingNotifier {
    async fn publish(&self, notification: Notification) -> TwinResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TwinError::Notification("channel unavailable".to_string()));
        }
        self.published.write().push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::{EventFilter, EventTopic};

    fn notification(topic: &str) -> Notification {
        Notification {
            topic: topic.to_string(),
            id: "twin-1".to_string(),
            error: None,
            payload: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_recording_notifier_stores_notifications() {
        let channel = RecordingNotifier::new();
        channel.publish(notification("create/success")).await.unwrap();

        channel.fail_publishes(true);
        assert!(channel.publish(notification("remove/success")).await.is_err());

        assert_eq!(channel.attempts(), 2);
        assert_eq!(channel.published().len(), 1);
        assert_eq!(channel.published()[0].topic, "create/success");
    }

    #[tokio::test]
    async fn test_event_bus_notifier_publishes_outcome() {
        let event_bus = Arc::new(InMemoryEventBus::new());
        let mut sub = event_bus.subscribe(EventFilter::topics(vec![EventTopic::Outcome]));
        let channel = EventBusNotifier::new(Arc::clone(&event_bus));

        channel.publish(notification("update/success")).await.unwrap();

        match sub.recv().await {
            Some(TwinEvent::OutcomeAnnounced(n)) => assert_eq!(n.topic, "update/success"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_event_bus_notifier_without_observers() {
        let channel = EventBusNotifier::new(Arc::new(InMemoryEventBus::new()));
        assert!(channel.publish(notification("state/failure")).await.is_ok());
    }
}
