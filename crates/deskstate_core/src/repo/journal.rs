//! Request-scoped update journal.
//!
//! # Invariants
//! - Records are append-only and kept in issuance order.
//! - One journal belongs to exactly one request; it is never shared.

use crate::model::{ObjectKind, StoredObject};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mutation kind carried by an [`UpdateRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    Created,
    Updated,
    Deleted,
}

/// Immutable description of one mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
    pub update_type: UpdateType,
    pub otype: ObjectKind,
    pub oid: String,
    /// Resulting object value; absent for deletions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj: Option<Value>,
}

impl UpdateRecord {
    pub(crate) fn for_object<T: StoredObject>(update_type: UpdateType, obj: &T) -> Self {
        // Called after the store already encoded `obj` for its write.
        let value = match serde_json::to_value(obj) {
            Ok(value) => Some(value),
            Err(err) => {
                error!(
                    "event=journal_record module=store status=error otype={} oid={} error={}",
                    T::KIND,
                    obj.oid(),
                    err
                );
                debug_assert!(false, "cannot encode journaled {} {}: {err}", T::KIND, obj.oid());
                None
            }
        };
        Self {
            update_type,
            otype: T::KIND,
            oid: obj.oid().to_string(),
            obj: value,
        }
    }

    /// Decodes the carried object as `T`, if the record is of kind `T`.
    pub fn object<T: StoredObject>(&self) -> Option<T> {
        if self.otype != T::KIND {
            return None;
        }
        self.obj
            .as_ref()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Ordered records drained from one journal.
pub type UpdateBatch = Vec<UpdateRecord>;

#[derive(Debug, Clone, Default)]
pub struct UpdateJournal {
    records: Vec<UpdateRecord>,
}

impl UpdateJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: UpdateRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[UpdateRecord] {
        &self.records
    }

    pub fn to_batch(&self) -> UpdateBatch {
        self.records.clone()
    }
}
