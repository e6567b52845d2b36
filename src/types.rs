//! Core types for the resource cache.

use crate::records::values_equal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the dirty flag in the serialized form of a record.
pub const DIRTY_FIELD: &str = "isDirty";

/// Field used for identity lookups.
pub const ID_FIELD: &str = "id";

/// A stored record together with its sync metadata.
///
/// The dirty flag lives beside the record rather than inside it, so
/// structural comparisons of records never see metadata. It is merged into
/// the object only on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Application fields, without `isDirty`.
    pub record: Map<String, Value>,

    /// The stored `isDirty` value, kept as found so rewrites of the
    /// collection preserve it. `None` for records that never went through
    /// the store.
    pub is_dirty: Option<Value>,
}

impl Entry {
    /// Split a JSON object into record fields and metadata.
    ///
    /// Returns `None` for anything that is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(mut record) => {
                let is_dirty = record.remove(DIRTY_FIELD);
                Some(Self { record, is_dirty })
            }
            _ => None,
        }
    }

    /// The wire form: record fields with `isDirty` merged back in.
    pub fn into_raw(self) -> Value {
        let mut record = self.record;
        if let Some(dirty) = self.is_dirty {
            record.insert(DIRTY_FIELD.to_string(), dirty);
        }
        Value::Object(record)
    }

    /// The wire form without consuming the entry.
    pub fn to_raw(&self) -> Value {
        self.clone().into_raw()
    }

    /// The record as seen by ordinary readers.
    pub fn into_clean(self) -> Value {
        Value::Object(self.record)
    }

    pub fn id(&self) -> Option<&Value> {
        self.record.get(ID_FIELD)
    }

    pub fn has_id(&self, id: &Value) -> bool {
        self.id().map_or(false, |own| values_equal(own, id))
    }

    /// Strictly dirty: the flag is present and `true`.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty == Some(Value::Bool(true))
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.is_dirty = Some(Value::Bool(dirty));
    }
}

/// What `persist` did with a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PersistOutcome {
    /// Appended to the collection.
    Stored { dirty: bool },
    /// Structurally equal to an existing record; nothing was written.
    Duplicate,
    /// The input was null or absent.
    Skipped,
}

impl PersistOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, PersistOutcome::Stored { .. })
    }
}
