//! State snapshots and the persistence decision
//!
//! ## Decision
//!
//! ```text
//! latest definition ──→ first attribute with persist_state
//!                        and (channel, subtopic) == message's
//!                             │
//!              none ──────────┴────────── match
//!                │                          │
//!            discard          previous state + first record's value
//!                                           │
//!                                 id + 1, stamped, appended
//! ```

use crate::domain::senml::Record;
use crate::domain::twin::{Twin, TwinId};
use crate::error::{TwinError, TwinResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::TelemetryMessage;
use std::collections::BTreeMap;

/// One persisted snapshot of captured attribute values
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub twin_id: TwinId,
    /// Per-twin sequence number, continuing from the last persisted state
    pub id: u64,
    /// Id of the definition active when the snapshot was captured
    pub definition: u64,
    pub created: DateTime<Utc>,
    /// Attribute name to last captured value
    #[serde(default)]
    pub payload: BTreeMap<String, Value>,
}

impl State {
    /// Whether this is the placeholder returned for a twin with no states.
    pub fn is_initial(&self) -> bool {
        self.twin_id.is_empty() && self.id == 0
    }
}

/// One page of states
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatesPage {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub states: Vec<State>,
}

/// Decide whether `msg` changes the twin's state and build the successor.
///
/// Only the twin's latest definition is consulted. Returns `Ok(None)` when
/// no persistable attribute is bound to the message's coordinate. Values
/// captured earlier are carried over unless the same attribute is captured
/// again.
pub fn next_state(
    previous: &State,
    twin: &Twin,
    records: &[Record],
    msg: &TelemetryMessage,
    now: DateTime<Utc>,
) -> TwinResult<Option<State>> {
    let definition = twin.latest_definition().ok_or_else(|| {
        TwinError::MalformedEntity(format!("twin {} has no definition", twin.id))
    })?;

    let Some(attribute) = definition.capturing_attribute(&msg.channel, &msg.subtopic) else {
        return Ok(None);
    };

    let record = records
        .first()
        .ok_or_else(|| TwinError::Decode("payload carries no records".to_string()))?;

    let mut payload = previous.payload.clone();
    payload.insert(
        attribute.to_string(),
        record.captured_value().unwrap_or(Value::Null),
    );

    Ok(Some(State {
        twin_id: twin.id.clone(),
        id: previous.id + 1,
        definition: definition.id,
        created: now,
        payload,
    }))
}
