//! Twins Service - Core business logic
//!
//! Lifecycle operations on twins plus the telemetry-driven state save. Every
//! mutating operation runs inside [`OutcomeNotifier::observe`], so its result
//! is announced exactly once whichever way it exits.

use crate::domain::{
    decode_records, next_state, Definition, Metadata, StatesPage, Twin, TwinDraft, TwinPatch,
    TwinsPage,
};
use crate::error::{TwinError, TwinResult};
use crate::outcome::{Operation, Outcome, OutcomeNotifier};
use crate::ports::inbound::TwinsApi;
use crate::ports::outbound::{
    IdProvider, IdentityVerifier, NotificationChannel, StateRepository, TwinRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use shared_types::TelemetryMessage;
use std::sync::Arc;
use tracing::{debug, info};

/// Twins service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Largest page a list operation may request
    pub max_page_limit: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_page_limit: 100,
        }
    }
}

/// Twins Service implementation
pub struct TwinsService<V, I, T, S, N>
where
    V: IdentityVerifier,
    I: IdProvider,
    T: TwinRepository,
    S: StateRepository,
    N: NotificationChannel,
{
    config: ServiceConfig,
    verifier: Arc<V>,
    ids: Arc<I>,
    twins: Arc<T>,
    states: Arc<S>,
    notifier: OutcomeNotifier<N>,
}

impl<V, I, T, S, N> TwinsService<V, I, T, S, N>
where
    V: IdentityVerifier,
    I: IdProvider,
    T: TwinRepository,
    S: StateRepository,
    N: NotificationChannel,
{
    /// Create new twins service
    pub fn new(
        config: ServiceConfig,
        verifier: Arc<V>,
        ids: Arc<I>,
        twins: Arc<T>,
        states: Arc<S>,
        notifications: Arc<N>,
    ) -> Self {
        Self {
            config,
            verifier,
            ids,
            twins,
            states,
            notifier: OutcomeNotifier::new(notifications),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    async fn identify(&self, token: &str) -> TwinResult<String> {
        self.verifier.identify(token).await.map_err(|e| {
            debug!(error = %e, "Identity verification failed");
            TwinError::Unauthorized
        })
    }

    fn check_page(&self, limit: u64) -> TwinResult<()> {
        if limit == 0 || limit > self.config.max_page_limit {
            return Err(TwinError::MalformedEntity(format!(
                "page limit must be between 1 and {}, got {}",
                self.config.max_page_limit, limit
            )));
        }
        Ok(())
    }

    async fn create(
        &self,
        outcome: &Outcome,
        token: &str,
        draft: TwinDraft,
        definition: Definition,
    ) -> TwinResult<Twin> {
        let owner = self.identify(token).await?;
        let id = self.ids.id()?;

        let twin = Twin::new(id, owner, draft, definition, Utc::now());
        let id = self.twins.save(twin.clone()).await?;

        outcome.record_id(id.as_str());
        outcome.record_entity(&twin);
        info!(twin = %id, owner = %twin.owner, "Twin created");
        Ok(twin)
    }

    async fn update(
        &self,
        outcome: &Outcome,
        token: &str,
        patch: TwinPatch,
        definition: Definition,
    ) -> TwinResult<()> {
        self.identify(token).await?;

        let mut twin = self.twins.retrieve_by_id(&patch.id).await?;
        twin.apply_patch(patch, definition, Utc::now());
        self.twins.update(twin.clone()).await?;

        outcome.record_id(twin.id.as_str());
        outcome.record_entity(&twin);
        info!(twin = %twin.id, revision = twin.revision, "Twin updated");
        Ok(())
    }

    async fn remove(&self, outcome: &Outcome, token: &str, id: &str) -> TwinResult<()> {
        outcome.record_id(id);
        self.identify(token).await?;

        self.twins.remove(id).await?;
        info!(twin = %id, "Twin removed");
        Ok(())
    }

    async fn save(&self, outcome: &Outcome, msg: &TelemetryMessage) -> TwinResult<()> {
        let publisher = msg.publisher.as_str();

        let twin = self
            .twins
            .retrieve_by_thing(publisher)
            .await
            .map_err(|e| e.for_publisher(publisher, "retrieving twin"))?;

        let records =
            decode_records(&msg.payload).map_err(|e| e.for_publisher(publisher, "decoding payload"))?;

        let previous = self
            .states
            .retrieve_last(&twin.id)
            .await
            .map_err(|e| e.for_publisher(publisher, "retrieving last state"))?;

        let Some(state) = next_state(&previous, &twin, &records, msg, Utc::now())
            .map_err(|e| e.for_publisher(publisher, "preparing state"))?
        else {
            debug!(
                twin = %twin.id,
                channel = %msg.channel,
                subtopic = %msg.subtopic,
                "No attribute persists this coordinate"
            );
            return Ok(());
        };

        let state_id = state.id;
        self.states
            .save(state)
            .await
            .map_err(|e| e.for_publisher(publisher, "saving state"))?;

        outcome.record_id(publisher);
        outcome.record_payload(msg.payload.clone());
        debug!(twin = %twin.id, state = state_id, "State saved");
        Ok(())
    }
}

#[async_trait]
impl<V, I, T, S, N> TwinsApi for TwinsService<V, I, T, S, N>
where
    V: IdentityVerifier + 'static,
    I: IdProvider + 'static,
    T: TwinRepository + 'static,
    S: StateRepository + 'static,
    N: NotificationChannel + 'static,
{
    async fn add_twin(&self, token: &str, draft: TwinDraft, definition: Definition) -> TwinResult<Twin> {
        let outcome = Outcome::new();
        self.notifier
            .observe(
                Operation::Create,
                &outcome,
                self.create(&outcome, token, draft, definition),
            )
            .await
    }

    async fn update_twin(&self, token: &str, patch: TwinPatch, definition: Definition) -> TwinResult<()> {
        let outcome = Outcome::new();
        self.notifier
            .observe(
                Operation::Update,
                &outcome,
                self.update(&outcome, token, patch, definition),
            )
            .await
    }

    async fn view_twin(&self, token: &str, id: &str) -> TwinResult<Twin> {
        self.identify(token).await?;
        self.twins.retrieve_by_id(id).await
    }

    async fn view_twin_by_thing(&self, token: &str, thing_id: &str) -> TwinResult<Twin> {
        self.identify(token).await?;
        self.twins.retrieve_by_thing(thing_id).await
    }

    async fn list_twins(
        &self,
        token: &str,
        offset: u64,
        limit: u64,
        name: &str,
        metadata: &Metadata,
    ) -> TwinResult<TwinsPage> {
        let owner = self.identify(token).await?;
        self.check_page(limit)?;
        self.twins
            .retrieve_all(&owner, offset, limit, name, metadata)
            .await
    }

    async fn remove_twin(&self, token: &str, id: &str) -> TwinResult<()> {
        let outcome = Outcome::new();
        self.notifier
            .observe(Operation::Remove, &outcome, self.remove(&outcome, token, id))
            .await
    }

    async fn save_state(&self, msg: &TelemetryMessage) -> TwinResult<()> {
        let outcome = Outcome::new();
        self.notifier
            .observe(Operation::State, &outcome, self.save(&outcome, msg))
            .await
    }

    async fn list_states(&self, token: &str, offset: u64, limit: u64, twin_id: &str) -> TwinResult<StatesPage> {
        self.identify(token).await?;
        self.check_page(limit)?;
        self.states.retrieve_all(offset, limit, twin_id).await
    }
}
