//! The contract a domain object satisfies to be stored, and the envelope the
//! engine wraps around it.
//!
//! A stored record's content is always an [`Envelope`]:
//!
//! ```json
//! {
//!   "Version": "v2",
//!   "Indexes": { "RoomId": "r-101" },
//!   "Data": { /* the domain object's own fields */ }
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::db_error::DbResult;
use crate::schema::Schema;

/// Storage format version stamped on every envelope written by this crate.
pub const RECORD_VERSION: &str = "v2";

/// Capabilities a domain object provides to the storage engine.
///
/// On insert the engine runs [`Model::validate`] and then
/// [`Model::before_insert`]; a failure from either aborts the insert.
pub trait Model {
    /// Indexed fields, evaluated against the instance's current state.
    fn schema(&self) -> Schema;

    /// Business validation. Must not mutate the instance.
    fn validate(&self) -> DbResult<()>;

    /// Whether writes to this model require the names from
    /// [`Model::lock_file_names`] to be held.
    fn is_lockable(&self) -> bool {
        false
    }

    /// Lock resource names for this instance. Two instances describing the
    /// same logical resource must return the same names.
    fn lock_file_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether the serialized envelope goes through the dataset cipher.
    fn should_encrypt(&self) -> bool {
        false
    }

    /// Lifecycle hook run right before indexes are captured; usually stamps
    /// timestamps.
    fn before_insert(&mut self) -> DbResult<()> {
        Ok(())
    }
}

/// Created/updated stamps for models that want them.
///
/// Embed with `#[serde(flatten)]` and call [`Timestamps::stamp`] from
/// [`Model::before_insert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Timestamps {
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Timestamps {
    pub fn stamp(&mut self) {
        self.stamp_at(Utc::now());
    }

    /// Sets `created_at` only when unset; always refreshes `updated_at`.
    pub fn stamp_at(&mut self, now: DateTime<Utc>) {
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.updated_at = Some(now);
    }
}

/// Versioned wrapper placed around a model before serialization.
///
/// The envelope only adds the version stamp and the index snapshot; every
/// [`Model`] operation is forwarded to the wrapped value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope<M> {
    pub version: String,
    #[serde(default)]
    pub indexes: BTreeMap<String, JsonValue>,
    pub data: M,
}

/// Wraps `model` in an envelope carrying [`RECORD_VERSION`] and no indexes yet.
pub fn wrap<M: Model>(model: M) -> Envelope<M> {
    Envelope {
        version: RECORD_VERSION.to_string(),
        indexes: BTreeMap::new(),
        data: model,
    }
}

impl<M> Envelope<M> {
    pub fn data(&self) -> &M {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut M {
        &mut self.data
    }

    pub fn into_inner(self) -> M {
        self.data
    }
}

impl<M: Model> Model for Envelope<M> {
    fn schema(&self) -> Schema {
        self.data.schema()
    }

    fn validate(&self) -> DbResult<()> {
        self.data.validate()
    }

    fn is_lockable(&self) -> bool {
        self.data.is_lockable()
    }

    fn lock_file_names(&self) -> Vec<String> {
        self.data.lock_file_names()
    }

    fn should_encrypt(&self) -> bool {
        self.data.should_encrypt()
    }

    // indexes are re-read after the hook so they never predate its mutations
    fn before_insert(&mut self) -> DbResult<()> {
        let result = self.data.before_insert();
        self.indexes = self.data.schema().into_indexes();
        result
    }
}
