//! Driven Ports (SPI - Outbound Dependencies)
//!
//! ## Atomicity
//!
//! Revisions and state ids are computed read-then-write against these
//! repositories. Concurrent writers of the same twin are serialized only if
//! the repository serializes writes per id; the service takes no locks.

use crate::domain::{Metadata, State, StatesPage, Twin, TwinId, TwinsPage};
use crate::error::TwinResult;
use async_trait::async_trait;
use shared_types::Notification;

/// Resolves a credential to the principal it belongs to
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Any error is reported to callers as `Unauthorized`.
    async fn identify(&self, token: &str) -> TwinResult<String>;
}

/// Issues new twin identifiers
pub trait IdProvider: Send + Sync {
    fn id(&self) -> TwinResult<TwinId>;
}

/// Twin storage
#[async_trait]
pub trait TwinRepository: Send + Sync {
    /// Persist a new twin and return its id.
    async fn save(&self, twin: Twin) -> TwinResult<TwinId>;

    /// Overwrite a stored twin. `NotFound` if it does not exist.
    async fn update(&self, twin: Twin) -> TwinResult<()>;

    /// `NotFound` if absent.
    async fn retrieve_by_id(&self, id: &str) -> TwinResult<Twin>;

    /// Twin currently representing `thing_id`. `NotFound` if none.
    async fn retrieve_by_thing(&self, thing_id: &str) -> TwinResult<Twin>;

    /// Page of `owner`'s twins. Empty `name` and `metadata` do not filter.
    async fn retrieve_all(
        &self,
        owner: &str,
        offset: u64,
        limit: u64,
        name: &str,
        metadata: &Metadata,
    ) -> TwinResult<TwinsPage>;

    async fn remove(&self, id: &str) -> TwinResult<()>;
}

/// Append-only state storage
#[async_trait]
pub trait StateRepository: Send + Sync {
    async fn save(&self, state: State) -> TwinResult<()>;

    /// Most recently persisted state, or `State::default()` when the twin
    /// has none yet.
    async fn retrieve_last(&self, twin_id: &str) -> TwinResult<State>;

    async fn retrieve_all(&self, offset: u64, limit: u64, twin_id: &str) -> TwinResult<StatesPage>;
}

/// Best-effort outlet for outcome notifications
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn publish(&self, notification: Notification) -> TwinResult<()>;
}
