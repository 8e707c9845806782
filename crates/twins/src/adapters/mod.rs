//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits: in-memory storage, static credentials,
//! UUID ids and event bus notifications.

mod identity;
mod memory;
mod notifier;

pub use identity::{StaticIdentityVerifier, UuidIdProvider};
pub use memory::{InMemoryStateRepository, InMemoryTwinRepository};
pub use notifier::{EventBusNotifier, RecordingNotifier};
