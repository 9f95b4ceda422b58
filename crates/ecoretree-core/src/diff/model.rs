//! Change set type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Payload;

/// Changed fields of a payload, in field order
///
/// Scalar and list fields map to their new value. Object fields that differ
/// map to the nested change set of that object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changes: Payload,
}

impl ChangeSet {
    pub(crate) fn insert(&mut self, field: String, change: Value) {
        self.changes.insert(field, change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// The first changed field; the only one transmitted as an edit
    pub fn first_field(&self) -> Option<&str> {
        self.changes.keys().next().map(String::as_str)
    }

    /// All changed fields, in order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.changes.get(field)
    }

    pub fn as_payload(&self) -> &Payload {
        &self.changes
    }
}
