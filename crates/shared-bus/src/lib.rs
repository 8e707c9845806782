//! # Shared Bus - Event Bus for Twin Telemetry and Outcomes
//!
//! Two kinds of traffic share one broadcast channel:
//!
//! - **Telemetry**: batches pushed by the broker, consumed by the state
//!   decision engine.
//! - **Outcome**: one notification per mutating twin operation, consumed by
//!   whoever wants to observe successes and failures without polling.
//!
//! ```text
//! [Broker] ──TelemetryReceived──→ [Event Bus] ──→ [SaveState consumer]
//!                                      ↑
//! [Twins service] ──OutcomeAnnounced───┘ ──→ [Outcome observers]
//! ```
//!
//! Delivery is best-effort: an event published with no live subscriber is
//! dropped, and slow subscribers skip what they lagged behind on.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, TwinEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription};

/// Maximum events to buffer per subscriber before the slowest one lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
