//! Twin and Definition entities
//!
//! A twin carries an append-only list of definitions. Only the latest one
//! decides which telemetry gets captured; earlier ones are kept as history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque twin identifier
pub type TwinId = String;

/// Free-form annotation attached to a twin
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Binding of a telemetry topic coordinate to a persistence policy
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub channel: String,
    #[serde(default)]
    pub subtopic: String,
    /// Capture values arriving on (channel, subtopic) into twin state
    #[serde(default)]
    pub persist_state: bool,
}

impl Attribute {
    pub fn new(channel: impl Into<String>, subtopic: impl Into<String>, persist_state: bool) -> Self {
        Self {
            channel: channel.into(),
            subtopic: subtopic.into(),
            persist_state,
        }
    }

    /// Whether this attribute captures values published on the given coordinate.
    pub fn captures(&self, channel: &str, subtopic: &str) -> bool {
        self.persist_state && self.channel == channel && self.subtopic == subtopic
    }
}

/// One versioned attribute schema of a twin
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Sequence number, 0 for the definition attached at creation
    pub id: u64,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
}

impl Definition {
    /// Definition with no attributes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Definition with the given attributes. Id and timestamp are stamped
    /// when it is attached to a twin.
    pub fn with_attributes<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Attribute)>,
        K: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(|(k, a)| (k.into(), a)).collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Name of the attribute capturing values on (channel, subtopic).
    ///
    /// Attributes are scanned in key order and the scan stops at the first
    /// match. Several attributes bound to the same coordinate are not
    /// rejected; only the first one is ever captured.
    pub fn capturing_attribute(&self, channel: &str, subtopic: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(_, attr)| attr.captures(channel, subtopic))
            .map(|(name, _)| name.as_str())
    }
}

/// Caller-supplied fields of a new twin
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TwinDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub thing_id: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Partial update of an existing twin
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TwinPatch {
    pub id: TwinId,
    /// Replaces the stored name when non-empty
    #[serde(default)]
    pub name: String,
    /// Replaces the stored thing id when non-empty
    #[serde(default)]
    pub thing_id: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Logical representation of a data-producing thing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Twin {
    pub owner: String,
    pub id: TwinId,
    pub name: String,
    pub thing_id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub revision: u64,
    pub definitions: Vec<Definition>,
    pub metadata: Metadata,
}

impl Twin {
    /// Build a twin at revision 0 carrying `definition` as its only one.
    ///
    /// The definition always gets id 0 and `now` as its creation time.
    pub fn new(
        id: TwinId,
        owner: String,
        draft: TwinDraft,
        mut definition: Definition,
        now: DateTime<Utc>,
    ) -> Self {
        definition.id = 0;
        definition.created = now;

        Self {
            owner,
            id,
            name: draft.name,
            thing_id: draft.thing_id,
            created: now,
            updated: now,
            revision: 0,
            definitions: vec![definition],
            metadata: draft.metadata,
        }
    }

    /// The definition currently used for routing telemetry.
    pub fn latest_definition(&self) -> Option<&Definition> {
        self.definitions.last()
    }

    /// Stamp `definition` as the successor of the latest one and append it.
    pub fn append_definition(&mut self, mut definition: Definition, now: DateTime<Utc>) -> u64 {
        definition.id = self
            .latest_definition()
            .map_or(0, |latest| latest.id + 1);
        definition.created = now;

        let id = definition.id;
        self.definitions.push(definition);
        id
    }

    /// Apply a partial update and bump the revision.
    ///
    /// Name and thing id change only when the patch carries a non-empty
    /// value. A definition is appended only when it has attributes.
    pub fn apply_patch(&mut self, patch: TwinPatch, definition: Definition, now: DateTime<Utc>) {
        self.updated = now;
        self.revision += 1;

        if !patch.name.is_empty() {
            self.name = patch.name;
        }

        if !patch.thing_id.is_empty() {
            self.thing_id = patch.thing_id;
        }

        if !definition.is_empty() {
            self.append_definition(definition, now);
        }

        // Long-standing behavior: metadata is overwritten only when the patch
        // carries none, which clears it. Kept as-is until clients agree on
        // the intended semantics.
        if patch.metadata.is_empty() {
            self.metadata = patch.metadata;
        }
    }
}

/// One page of twins
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TwinsPage {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub twins: Vec<Twin>,
}
