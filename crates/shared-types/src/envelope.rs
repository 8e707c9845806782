//! # `TelemetryMessage` Envelope
//!
//! The wrapper the broker uses to deliver a batch of telemetry records.
//!
//! ## Routing Properties
//!
//! - **Publisher**: identifier of the thing that produced the batch. Maps to a
//!   twin's `thing_id`.
//! - **Channel / Subtopic**: the topic coordinate the batch arrived on. Twin
//!   attributes bind to this pair.
//! - **Payload**: raw bytes, expected to decode into an ordered sequence of
//!   value records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// An inbound telemetry batch.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMessage {
    /// Channel the batch was published on.
    pub channel: String,

    /// Optional subtopic below the channel. Empty when absent.
    #[serde(default)]
    pub subtopic: String,

    /// Identity of the publishing thing.
    pub publisher: String,

    /// Transport protocol the batch arrived over (e.g. "mqtt", "http").
    #[serde(default)]
    pub protocol: String,

    /// Undecoded record batch.
    #[serde_as(as = "Bytes")]
    pub payload: Vec<u8>,

    /// Time the broker accepted the batch.
    pub created: DateTime<Utc>,
}

impl TelemetryMessage {
    /// Create a message received now.
    pub fn new(
        publisher: impl Into<String>,
        channel: impl Into<String>,
        subtopic: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            channel: channel.into(),
            subtopic: subtopic.into(),
            publisher: publisher.into(),
            protocol: String::new(),
            payload,
            created: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_subtopic_defaults_to_empty() {
        let json = r#"{
            "channel": "chan-a",
            "publisher": "thing-1",
            "payload": [91, 93],
            "created": "2024-01-01T00:00:00Z"
        }"#;

        let msg: TelemetryMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.subtopic, "");
        assert_eq!(msg.protocol, "");
        assert_eq!(msg.payload, b"[]".to_vec());
    }
}
