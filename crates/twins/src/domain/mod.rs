//! # Domain Layer
//!
//! Pure twin logic with no I/O: entities, telemetry decoding and the
//! persistence decision.

pub mod senml;
pub mod state;
pub mod twin;

pub use senml::{decode_records, Record};
pub use state::{next_state, State, StatesPage};
pub use twin::{Attribute, Definition, Metadata, Twin, TwinDraft, TwinId, TwinPatch, TwinsPage};
