//! # Event Handlers
//!
//! Bus consumers driving the twins service.
//!
//! ## Flow
//!
//! 1. Broker publishes `TelemetryReceived` on the bus
//! 2. `TelemetryHandler` hands the batch to `save_state`
//! 3. The service announces `state/*` as `OutcomeAnnounced`
//! 4. `OutcomeObserver` counts every announcement by operation and result

use std::sync::Arc;

use shared_bus::{EventStream, Subscription, TwinEvent};
use shared_types::TelemetryMessage;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};
use twin_telemetry::{metric_inc, time_histogram, OUTCOMES, STATE_SAVE_DURATION, TELEMETRY_MESSAGES};
use twins::TwinsApi;

/// Feeds telemetry batches into `save_state`.
pub struct TelemetryHandler<A: TwinsApi> {
    subscription: Subscription,
    service: Arc<A>,
}

impl<A: TwinsApi> TelemetryHandler<A> {
    /// Create a new handler reading from `subscription`.
    pub fn new(subscription: Subscription, service: Arc<A>) -> Self {
        Self {
            subscription,
            service,
        }
    }

    /// Run the handler loop until the bus closes.
    pub async fn run(mut self) {
        info!("Telemetry handler started");

        while let Some(event) = self.subscription.recv().await {
            if let TwinEvent::TelemetryReceived(msg) = event {
                self.handle(&msg).await;
            }
        }

        info!("Telemetry channel closed, exiting");
    }

    async fn handle(&self, msg: &TelemetryMessage) {
        let _timer = time_histogram!(STATE_SAVE_DURATION);

        match self.service.save_state(msg).await {
            Ok(()) => {
                metric_inc!(TELEMETRY_MESSAGES, &["handled"]);
                debug!(publisher = %msg.publisher, channel = %msg.channel, "Telemetry handled");
            }
            Err(e) if e.is_retryable() => {
                metric_inc!(TELEMETRY_MESSAGES, &["failed"]);
                warn!(publisher = %msg.publisher, error = %e, retryable = true, "State save failed");
            }
            Err(e) => {
                metric_inc!(TELEMETRY_MESSAGES, &["rejected"]);
                warn!(
                    publisher = %msg.publisher,
                    kind = e.kind(),
                    error = %e,
                    retryable = false,
                    "Telemetry rejected"
                );
            }
        }
    }
}

/// Counts outcome notifications.
pub struct OutcomeObserver {
    stream: EventStream,
}

impl OutcomeObserver {
    pub fn new(stream: EventStream) -> Self {
        Self { stream }
    }

    /// Run until the bus closes. Returns the number of outcomes observed.
    pub async fn run(mut self) -> u64 {
        info!("Outcome observer started");
        let mut observed = 0;

        while let Some(event) = self.stream.next().await {
            let TwinEvent::OutcomeAnnounced(notification) = event else {
                continue;
            };

            let result = if notification.is_failure() {
                "failure"
            } else {
                "success"
            };
            metric_inc!(OUTCOMES, &[notification.operation(), result]);
            debug!(
                topic = %notification.topic,
                id = %notification.id,
                error = ?notification.error,
                "Outcome observed"
            );
            observed += 1;
        }

        info!(observed, "Outcome stream closed, exiting");
        observed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::{EventFilter, EventPublisher, EventTopic, InMemoryEventBus};
    use shared_types::Notification;

    fn notification(topic: &str, error: Option<&str>) -> Notification {
        Notification {
            topic: topic.to_string(),
            id: "twin-1".to_string(),
            error: error.map(str::to_string),
            payload: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_outcome_observer_counts_until_close() {
        let bus = InMemoryEventBus::new();
        let observer = OutcomeObserver::new(bus.event_stream(EventFilter::topics(vec![EventTopic::Outcome])));
        let task = tokio::spawn(observer.run());

        let before = OUTCOMES.with_label_values(&["remove", "failure"]).get();
        bus.publish(TwinEvent::OutcomeAnnounced(notification("create/success", None)))
            .await;
        bus.publish(TwinEvent::OutcomeAnnounced(notification("remove/failure", Some("boom"))))
            .await;
        bus.publish(TwinEvent::TelemetryReceived(TelemetryMessage::new(
            "thing-1",
            "chan-1",
            "",
            Vec::new(),
        )))
        .await;
        drop(bus);

        assert_eq!(task.await.unwrap(), 2);
        assert!(OUTCOMES.with_label_values(&["remove", "failure"]).get() >= before + 1.0);
    }
}
