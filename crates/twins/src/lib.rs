//! # twins
//!
//! Digital twins: versioned attribute definitions, telemetry-driven state
//! snapshots and outcome notifications for every mutating operation.
//!
//! ## Overview
//!
//! This crate provides:
//! - **Definition store**: append-only, gapless definition history per twin
//! - **Telemetry decoder**: SenML-style record batches
//! - **State decision engine**: captures values bound by the latest definition
//! - **Lifecycle**: create, update, view, list and remove twins
//! - **Outcome notifier**: one success or failure notification per mutation
//!
//! ## Architecture
//!
//! ```text
//! Broker ──TelemetryMessage──→ save_state ──→ StateRepository
//!                                  │
//! Callers ──token──→ add/update/remove ──→ TwinRepository
//!                                  │
//!                                  └── Notification ──→ NotificationChannel
//! ```
//!
//! ## Notification Topics
//!
//! | Operation | Success | Failure |
//! |-----------|---------|---------|
//! | add_twin | `create/success` | `create/failure` |
//! | update_twin | `update/success` | `update/failure` |
//! | remove_twin | `remove/success` | `remove/failure` |
//! | save_state | `state/success` | `state/failure` |
//!
//! ## Example
//!
//! ```rust,ignore
//! use twins::{TwinsService, ServiceConfig};
//! use twins::ports::inbound::TwinsApi;
//!
//! let service = TwinsService::new(
//!     ServiceConfig::default(),
//!     verifier,
//!     ids,
//!     twin_repository,
//!     state_repository,
//!     notifications,
//! );
//!
//! let twin = service.add_twin(token, draft, definition).await?;
//! service.save_state(&telemetry).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod outcome;
pub mod ports;
pub mod service;

pub use domain::{
    Attribute, Definition, Metadata, Record, State, StatesPage, Twin, TwinDraft, TwinId,
    TwinPatch, TwinsPage,
};
pub use error::{TwinError, TwinResult};
pub use outcome::{Operation, Outcome, OutcomeNotifier};
pub use ports::TwinsApi;
pub use service::{ServiceConfig, TwinsService};
