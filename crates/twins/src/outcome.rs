//! Outcome notifier
//!
//! Wraps a mutating operation so that exactly one notification is published
//! when it finishes. The wrapped body records what it learns (entity id,
//! serialized entity) into an [`Outcome`] as it goes; the notifier reads the
//! final values after the body has returned through any exit path.
//!
//! ```text
//! observe(op, &outcome, body)
//!     │
//!     ├── body.await ──→ Ok(value) | Err(e)     (early `?` returns land here too)
//!     │
//!     └── publish { topic: op/success | op/failure, id, error, payload }
//!             │
//!             └── publish error: logged and dropped
//! ```
//!
//! A body that never completes (its caller dropped the future, or it
//! panicked) is still announced: the pending announcement publishes
//! `op/failure` from a spawned task when it is dropped armed.

use crate::error::{TwinError, TwinResult};
use crate::ports::NotificationChannel;
use parking_lot::Mutex;
use serde::Serialize;
use shared_types::Notification;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};
use twin_telemetry::NOTIFICATIONS_DROPPED;

/// Mutating operations that announce their outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Remove,
    State,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::State => "state",
        }
    }

    pub fn success_topic(&self) -> &'static str {
        match self {
            Self::Create => "create/success",
            Self::Update => "update/success",
            Self::Remove => "remove/success",
            Self::State => "state/success",
        }
    }

    pub fn failure_topic(&self) -> &'static str {
        match self {
            Self::Create => "create/failure",
            Self::Update => "update/failure",
            Self::Remove => "remove/failure",
            Self::State => "state/failure",
        }
    }
}

#[derive(Debug, Default)]
struct Recorded {
    id: String,
    payload: Vec<u8>,
}

/// What a running operation has learned about its entity so far
#[derive(Debug, Default)]
pub struct Outcome {
    recorded: Mutex<Recorded>,
}

impl Outcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_id(&self, id: impl Into<String>) {
        self.recorded.lock().id = id.into();
    }

    pub fn record_payload(&self, payload: Vec<u8>) {
        self.recorded.lock().payload = payload;
    }

    /// Record the JSON form of `entity`.
    ///
    /// Serialization failures leave the payload empty; they do not fail the
    /// operation.
    pub fn record_entity<T: Serialize>(&self, entity: &T) {
        match serde_json::to_vec(entity) {
            Ok(payload) => self.record_payload(payload),
            Err(e) => warn!(error = %e, "Failed to serialize notification payload"),
        }
    }

    fn take(&self) -> (String, Vec<u8>) {
        let mut recorded = self.recorded.lock();
        (
            std::mem::take(&mut recorded.id),
            std::mem::take(&mut recorded.payload),
        )
    }
}

/// Publishes one notification per observed operation
pub struct OutcomeNotifier<N: NotificationChannel> {
    channel: Arc<N>,
}

impl<N: NotificationChannel> Clone for OutcomeNotifier<N> {
    fn clone(&self) -> Self {
        Self {
            channel: Arc::clone(&self.channel),
        }
    }
}

impl<N: NotificationChannel> OutcomeNotifier<N> {
    pub fn new(channel: Arc<N>) -> Self {
        Self { channel }
    }
}

impl<N: NotificationChannel + 'static> OutcomeNotifier<N> {
    /// Run `body` to completion, then announce its result.
    ///
    /// The body's result is returned unchanged; publish failures never reach
    /// the caller. If the returned future is dropped before `body` finishes,
    /// or `body` panics, a failure is announced in the background instead.
    pub async fn observe<T, F>(&self, operation: Operation, outcome: &Outcome, body: F) -> TwinResult<T>
    where
        F: Future<Output = TwinResult<T>>,
    {
        let mut pending = PendingAnnouncement {
            channel: &self.channel,
            operation,
            outcome,
            armed: true,
        };
        let result = body.await;
        pending.armed = false;

        self.announce(operation, outcome, result.as_ref().err()).await;
        result
    }

    async fn announce(&self, operation: Operation, outcome: &Outcome, error: Option<&TwinError>) {
        let (id, payload) = outcome.take();
        let notification = match error {
            None => Notification {
                topic: operation.success_topic().to_string(),
                id,
                error: None,
                payload,
            },
            Some(err) => Notification {
                topic: operation.failure_topic().to_string(),
                id,
                error: Some(err.to_string()),
                payload,
            },
        };

        deliver(self.channel.as_ref(), notification).await;
    }
}

async fn deliver<N: NotificationChannel>(channel: &N, notification: Notification) {
    let topic = notification.topic.clone();
    match channel.publish(notification).await {
        Ok(()) => debug!(topic = %topic, "Outcome announced"),
        Err(e) => {
            NOTIFICATIONS_DROPPED.with_label_values(&[topic.as_str()]).inc();
            warn!(topic = %topic, error = %e, "Outcome notification dropped");
        }
    }
}

/// Announces a failure on drop unless disarmed.
struct PendingAnnouncement<'a, N: NotificationChannel + 'static> {
    channel: &'a Arc<N>,
    operation: Operation,
    outcome: &'a Outcome,
    armed: bool,
}

impl<N: NotificationChannel + 'static> Drop for PendingAnnouncement<'_, N> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let reason = if std::thread::panicking() {
            "operation panicked"
        } else {
            "operation cancelled"
        };
        let (id, payload) = self.outcome.take();
        let notification = Notification {
            topic: self.operation.failure_topic().to_string(),
            id,
            error: Some(reason.to_string()),
            payload,
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let channel = Arc::clone(self.channel);
                handle.spawn(async move {
                    deliver(channel.as_ref(), notification).await;
                });
            }
            Err(_) => {
                NOTIFICATIONS_DROPPED
                    .with_label_values(&[notification.topic.as_str()])
                    .inc();
                warn!(topic = %notification.topic, reason, "No runtime to announce outcome on");
            }
        }
    }
}
