//! # Twin Runtime
//!
//! Wires the twins service to the shared event bus and runs its consumers.
//!
//! ## Modular Structure
//!
//! - `config` - Runtime configuration from the environment
//! - `handlers` - Telemetry consumer and outcome observer
//!
//! ## Flow
//!
//! ```text
//! Broker ──TelemetryReceived──→ Event Bus ──→ TelemetryHandler ──→ save_state
//!                                   ↑                                  │
//!                                   └──────── OutcomeAnnounced ────────┘
//!                                   │
//!                                   └──→ OutcomeObserver (metrics)
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Load configuration
//! 2. Initialize logging and metrics
//! 3. Build bus, adapters and service (once)
//! 4. Subscribe and spawn handlers
//! 5. Run until Ctrl+C, then signal shutdown

pub mod config;
pub mod handlers;

use std::sync::Arc;

use shared_bus::{EventFilter, EventPublisher, EventTopic, InMemoryEventBus, TwinEvent};
use shared_types::TelemetryMessage;
use tokio::sync::watch;
use tracing::{error, info};
use twins::adapters::{
    EventBusNotifier, InMemoryStateRepository, InMemoryTwinRepository, StaticIdentityVerifier,
    UuidIdProvider,
};
use twins::TwinsService;

pub use config::{ConfigError, RuntimeConfig};
pub use handlers::{OutcomeObserver, TelemetryHandler};

/// The service type assembled by the runtime.
pub type RuntimeService = TwinsService<
    StaticIdentityVerifier,
    UuidIdProvider,
    InMemoryTwinRepository,
    InMemoryStateRepository,
    EventBusNotifier,
>;

/// The runtime owning the bus, the service and the shutdown signal.
pub struct TwinsRuntime {
    config: RuntimeConfig,
    event_bus: Arc<InMemoryEventBus>,
    service: Arc<RuntimeService>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl TwinsRuntime {
    /// Build the bus, adapters and service.
    pub fn new(config: RuntimeConfig) -> Self {
        info!(
            bus_capacity = config.bus_capacity,
            credentials = config.credentials.len(),
            "Creating twins runtime"
        );

        let event_bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));
        let service = Arc::new(TwinsService::new(
            config.service.clone(),
            Arc::new(StaticIdentityVerifier::new(config.credentials.clone())),
            Arc::new(UuidIdProvider),
            Arc::new(InMemoryTwinRepository::new()),
            Arc::new(InMemoryStateRepository::new()),
            Arc::new(EventBusNotifier::new(Arc::clone(&event_bus))),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            event_bus,
            service,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Subscribe the handlers and spawn them.
    ///
    /// Subscriptions are taken before this returns, so events published
    /// afterwards are seen by both handlers.
    pub fn start(&self) {
        let telemetry_filter = if self.config.telemetry_channels.is_empty() {
            EventFilter::topics(vec![EventTopic::Telemetry])
        } else {
            EventFilter::telemetry_channels(self.config.telemetry_channels.clone())
        };

        let telemetry_handler = TelemetryHandler::new(
            self.event_bus.subscribe(telemetry_filter),
            Arc::clone(&self.service),
        );
        let mut telemetry_shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = telemetry_handler.run() => {}
                _ = telemetry_shutdown.changed() => {
                    info!("Telemetry handler shutdown signal received");
                }
            }
        });

        let observer = OutcomeObserver::new(
            self.event_bus
                .event_stream(EventFilter::topics(vec![EventTopic::Outcome])),
        );
        let mut observer_shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = observer.run() => {}
                _ = observer_shutdown.changed() => {
                    info!("Outcome observer shutdown signal received");
                }
            }
        });

        info!("Twins runtime handlers started");
    }

    /// Broker ingress: put a telemetry batch on the bus.
    ///
    /// Returns the number of subscribers that received it.
    pub async fn ingest(&self, msg: TelemetryMessage) -> usize {
        self.event_bus
            .publish(TwinEvent::TelemetryReceived(msg))
            .await
    }

    /// Signal every handler to stop.
    pub fn shutdown(&self) {
        info!(
            events_published = self.event_bus.events_published(),
            "Initiating shutdown..."
        );
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
    }

    pub fn event_bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn service(&self) -> Arc<RuntimeService> {
        Arc::clone(&self.service)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}
