//! # Twin Events
//!
//! Defines every event type that flows through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::{Notification, TelemetryMessage};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TwinEvent {
    /// A telemetry batch arrived from the broker.
    TelemetryReceived(TelemetryMessage),

    /// A mutating twin operation finished, successfully or not.
    OutcomeAnnounced(Notification),
}

impl TwinEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::TelemetryReceived(_) => EventTopic::Telemetry,
            Self::OutcomeAnnounced(_) => EventTopic::Outcome,
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::TelemetryReceived(msg) => &msg.channel,
            Self::OutcomeAnnounced(notification) => &notification.topic,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Inbound telemetry batches.
    Telemetry,
    /// Outcome notifications of mutating operations.
    Outcome,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Telemetry channels to include. Empty means all channels.
    /// Outcome events ignore this field.
    pub channels: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            channels: Vec::new(),
        }
    }

    /// Create a filter for telemetry arriving on specific channels.
    #[must_use]
    pub fn telemetry_channels(channels: Vec<String>) -> Self {
        Self {
            topics: vec![EventTopic::Telemetry],
            channels,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &TwinEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let channel_match = match event {
            TwinEvent::TelemetryReceived(msg) => {
                self.channels.is_empty() || self.channels.contains(&msg.channel)
            }
            TwinEvent::OutcomeAnnounced(_) => true,
        };

        topic_match && channel_match
    }
}
