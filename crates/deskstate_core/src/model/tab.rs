//! Tab record.

use super::block::MetaMap;
use super::object::{new_oid, ObjectId, ObjectKind, StoredObject};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub oid: ObjectId,
    #[serde(default)]
    pub version: i64,
    pub name: String,
    /// Blocks owned by this tab, in creation order.
    #[serde(default)]
    pub block_ids: Vec<ObjectId>,
    #[serde(default)]
    pub meta: MetaMap,
}

impl Tab {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            oid: new_oid(),
            version: 0,
            name: name.into(),
            block_ids: Vec::new(),
            meta: MetaMap::new(),
        }
    }
}

impl StoredObject for Tab {
    const KIND: ObjectKind = ObjectKind::Tab;

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
