//! Client singleton record.
//!
//! # Invariants
//! - `window_ids` holds each window id at most once.
//! - Order of `window_ids` is focus order: index 0 is the most recently
//!   focused window.

use super::block::MetaMap;
use super::object::{new_oid, ObjectId, ObjectKind, StoredObject};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub oid: ObjectId,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub window_ids: Vec<ObjectId>,
    /// Unix epoch milliseconds of terms-of-service acceptance; `0` when not
    /// yet accepted.
    #[serde(default)]
    pub tos_agreed: i64,
    #[serde(default)]
    pub meta: MetaMap,
}

impl Client {
    pub fn new() -> Self {
        Self {
            oid: new_oid(),
            version: 0,
            window_ids: Vec::new(),
            tos_agreed: 0,
            meta: MetaMap::new(),
        }
    }

    pub fn has_agreed_tos(&self) -> bool {
        self.tos_agreed > 0
    }

    /// Appends a window id unless already present.
    pub fn add_window(&mut self, window_id: &str) -> bool {
        if self.window_ids.iter().any(|id| id == window_id) {
            return false;
        }
        self.window_ids.push(window_id.to_string());
        true
    }

    /// Moves `window_id` to the front of the focus stack.
    ///
    /// Returns `false` (and leaves the order untouched) when the id is
    /// unknown or already in front.
    pub fn focus_window(&mut self, window_id: &str) -> bool {
        match self.window_ids.iter().position(|id| id == window_id) {
            None | Some(0) => false,
            Some(idx) => {
                let id = self.window_ids.remove(idx);
                self.window_ids.insert(0, id);
                true
            }
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl StoredObject for Client {
    const KIND: ObjectKind = ObjectKind::Client;
    const SINGLETON: bool = true;

    fn oid(&self) -> &str {
        &self.oid
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}
