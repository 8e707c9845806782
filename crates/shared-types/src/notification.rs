//! # Outcome Notification
//!
//! One event per mutating operation, announcing success or failure to
//! downstream consumers. Delivery is best-effort.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// The announcement emitted after a mutating operation finishes.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Topic from the fixed taxonomy, e.g. `create/success` or `state/failure`.
    pub topic: String,

    /// Identity of the affected entity. Empty when the operation failed
    /// before an identity was known.
    pub id: String,

    /// Rendered error when the operation failed.
    pub error: Option<String>,

    /// Serialized resulting entity (or raw telemetry payload for state saves).
    #[serde_as(as = "Bytes")]
    pub payload: Vec<u8>,
}

impl Notification {
    /// Whether this notification announces a failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    /// The operation part of the topic (`create`, `update`, `remove`, `state`).
    #[must_use]
    pub fn operation(&self) -> &str {
        self.topic.split('/').next().unwrap_or_default()
    }
}
