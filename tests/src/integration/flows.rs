//! # Integration Test Flows
//!
//! Telemetry and lifecycle calls travel through the assembled runtime and
//! come back out as outcome notifications on the shared bus.
//!
//! ## Flows Tested:
//!
//! 1. **Telemetry → state**: a bound coordinate produces a state and `state/success`
//! 2. **Unknown publisher**: nothing persisted, `state/failure` announced
//! 3. **Lifecycle**: create, update and remove each announce exactly once, in order
//! 4. **Channel filter**: telemetry on unconsumed channels is ignored

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    use shared_bus::{EventFilter, EventStream, EventTopic, TwinEvent};
    use shared_types::{Notification, TelemetryMessage};
    use twin_runtime::{RuntimeConfig, TwinsRuntime};
    use twins::{Attribute, Definition, Metadata, TwinDraft, TwinPatch, TwinsApi};

    const TOKEN: &str = "s3cret";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn runtime_with(channels: Vec<String>) -> TwinsRuntime {
        let config = RuntimeConfig {
            credentials: vec![(TOKEN.to_string(), "alice@example.com".to_string())],
            telemetry_channels: channels,
            ..RuntimeConfig::default()
        };
        TwinsRuntime::new(config)
    }

    fn outcomes(runtime: &TwinsRuntime) -> EventStream {
        runtime
            .event_bus()
            .event_stream(EventFilter::topics(vec![EventTopic::Outcome]))
    }

    async fn next_outcome(stream: &mut EventStream) -> Notification {
        match timeout(Duration::from_secs(2), stream.next()).await {
            Ok(Some(TwinEvent::OutcomeAnnounced(notification))) => notification,
            other => panic!("expected an outcome, got {other:?}"),
        }
    }

    fn pump_draft() -> TwinDraft {
        TwinDraft {
            name: "pump".to_string(),
            thing_id: "thing-1".to_string(),
            metadata: Metadata::new(),
        }
    }

    fn temperature_definition() -> Definition {
        Definition::with_attributes([("temperature", Attribute::new("chan-1", "temp", true))])
    }

    // =============================================================================
    // INTEGRATION TESTS: TELEMETRY → STATE
    // =============================================================================

    #[tokio::test]
    async fn test_telemetry_produces_state_and_notification() {
        let runtime = runtime_with(Vec::new());
        let mut stream = outcomes(&runtime);
        runtime.start();

        let service = runtime.service();
        let twin = service
            .add_twin(TOKEN, pump_draft(), temperature_definition())
            .await
            .unwrap();
        assert_eq!(next_outcome(&mut stream).await.topic, "create/success");

        let payload = br#"[{"bn":"pump:","n":"temp","u":"Cel","v":21.5}]"#.to_vec();
        let received = runtime
            .ingest(TelemetryMessage::new("thing-1", "chan-1", "temp", payload.clone()))
            .await;
        assert!(received >= 1);

        let notification = next_outcome(&mut stream).await;
        assert_eq!(notification.topic, "state/success");
        assert_eq!(notification.id, "thing-1");
        assert_eq!(notification.payload, payload);

        let states = service.list_states(TOKEN, 0, 10, &twin.id).await.unwrap();
        assert_eq!(states.total, 1);
        assert_eq!(states.states[0].id, 1);
        assert_eq!(states.states[0].payload["temperature"], serde_json::json!(21.5));

        runtime.shutdown();
    }

    #[tokio::test]
    async fn test_unknown_publisher_announces_failure() {
        let runtime = runtime_with(Vec::new());
        let mut stream = outcomes(&runtime);
        runtime.start();

        runtime
            .ingest(TelemetryMessage::new(
                "stranger",
                "chan-1",
                "temp",
                br#"[{"v":1.0}]"#.to_vec(),
            ))
            .await;

        let notification = next_outcome(&mut stream).await;
        assert_eq!(notification.topic, "state/failure");
        assert!(notification.id.is_empty());
        assert!(notification
            .error
            .as_deref()
            .is_some_and(|e| e.contains("stranger")));

        runtime.shutdown();
    }

    // =============================================================================
    // INTEGRATION TESTS: LIFECYCLE ANNOUNCEMENTS
    // =============================================================================

    #[tokio::test]
    async fn test_lifecycle_announces_each_mutation_once() {
        let runtime = runtime_with(Vec::new());
        let mut stream = outcomes(&runtime);
        runtime.start();
        let service = runtime.service();

        let twin = service
            .add_twin(TOKEN, pump_draft(), Definition::empty())
            .await
            .unwrap();
        let patch = TwinPatch {
            id: twin.id.clone(),
            name: "valve".to_string(),
            ..TwinPatch::default()
        };
        service
            .update_twin(TOKEN, patch, temperature_definition())
            .await
            .unwrap();
        service.view_twin(TOKEN, &twin.id).await.unwrap();
        assert!(service.remove_twin("wrong", &twin.id).await.is_err());
        service.remove_twin(TOKEN, &twin.id).await.unwrap();

        let topics = [
            "create/success",
            "update/success",
            "remove/failure",
            "remove/success",
        ];
        for expected in topics {
            let notification = next_outcome(&mut stream).await;
            assert_eq!(notification.topic, expected);
            assert_eq!(notification.id, twin.id);
        }

        // Views are never announced
        assert!(timeout(Duration::from_millis(100), stream.next())
            .await
            .is_err());

        runtime.shutdown();
    }

    // =============================================================================
    // INTEGRATION TESTS: CHANNEL FILTER
    // =============================================================================

    #[tokio::test]
    async fn test_unconsumed_channel_is_ignored() {
        let runtime = runtime_with(vec!["chan-1".to_string()]);
        let mut stream = outcomes(&runtime);
        runtime.start();

        runtime
            .service()
            .add_twin(TOKEN, pump_draft(), temperature_definition())
            .await
            .unwrap();
        assert_eq!(next_outcome(&mut stream).await.topic, "create/success");

        runtime
            .ingest(TelemetryMessage::new(
                "thing-1",
                "chan-2",
                "temp",
                br#"[{"v":1.0}]"#.to_vec(),
            ))
            .await;
        assert!(timeout(Duration::from_millis(100), stream.next())
            .await
            .is_err());

        runtime
            .ingest(TelemetryMessage::new(
                "thing-1",
                "chan-1",
                "temp",
                br#"[{"v":2.0}]"#.to_vec(),
            ))
            .await;
        assert_eq!(next_outcome(&mut stream).await.topic, "state/success");

        runtime.shutdown();
    }
}
