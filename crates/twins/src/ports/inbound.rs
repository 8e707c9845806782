//! Driving Ports (API - Inbound)

use crate::domain::{Definition, Metadata, StatesPage, Twin, TwinDraft, TwinPatch, TwinsPage};
use crate::error::TwinResult;
use async_trait::async_trait;
use shared_types::TelemetryMessage;

/// Primary twins API
///
/// Every operation except `save_state` takes a caller credential.
/// `save_state` trusts the envelope's publisher identity.
///
/// `add_twin`, `update_twin`, `remove_twin` and `save_state` announce their
/// outcome on the notification channel, whether they succeed or fail.
#[async_trait]
pub trait TwinsApi: Send + Sync {
    /// Create a twin owned by the identified principal.
    ///
    /// The twin starts at revision 0 with `definition` as definition 0.
    async fn add_twin(&self, token: &str, draft: TwinDraft, definition: Definition) -> TwinResult<Twin>;

    /// Partially update the twin named by `patch.id` and bump its revision.
    async fn update_twin(&self, token: &str, patch: TwinPatch, definition: Definition) -> TwinResult<()>;

    /// Retrieve a twin by id.
    async fn view_twin(&self, token: &str, id: &str) -> TwinResult<Twin>;

    /// Retrieve the twin representing the given thing.
    async fn view_twin_by_thing(&self, token: &str, thing_id: &str) -> TwinResult<Twin>;

    /// List the caller's twins, optionally filtered by name and metadata.
    async fn list_twins(
        &self,
        token: &str,
        offset: u64,
        limit: u64,
        name: &str,
        metadata: &Metadata,
    ) -> TwinResult<TwinsPage>;

    /// Remove a twin by id.
    async fn remove_twin(&self, token: &str, id: &str) -> TwinResult<()>;

    /// Capture a telemetry batch into the publisher's twin state, if its
    /// latest definition persists the batch's coordinate.
    async fn save_state(&self, msg: &TelemetryMessage) -> TwinResult<()>;

    /// List the states of a twin.
    async fn list_states(&self, token: &str, offset: u64, limit: u64, twin_id: &str) -> TwinResult<StatesPage>;
}
