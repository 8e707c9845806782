//! # Shared Types Crate
//!
//! Wire types that cross crate boundaries:
//!
//! - [`TelemetryMessage`]: the inbound envelope pushed by the message broker.
//! - [`Notification`]: the outbound announcement of a mutating operation's outcome.
//!
//! ## Design Principles
//!
//! - **Envelope Identity**: The envelope's `publisher` is the only identity a
//!   telemetry batch carries; payload records never name their thing.
//! - **Opaque Payloads**: Neither type interprets its byte payload. Decoding
//!   belongs to the consumer.

pub mod envelope;
pub mod notification;

pub use envelope::TelemetryMessage;
pub use notification::Notification;
