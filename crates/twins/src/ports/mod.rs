//! # Ports Layer (Hexagonal Architecture)
//!
//! - `inbound`: the API the service exposes to callers
//! - `outbound`: the collaborators the service depends on

pub mod inbound;
pub mod outbound;

pub use inbound::TwinsApi;
pub use outbound::{IdProvider, IdentityVerifier, NotificationChannel, StateRepository, TwinRepository};
