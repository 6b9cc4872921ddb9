//! Workspace record: a named group of tabs.

use super::block::MetaMap;
use super::object::{new_oid, ObjectId, ObjectKind, StoredObject};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub oid: ObjectId,
    #[serde(default)]
    pub version: i64,
    pub name: String,
    #[serde(default)]
    pub tab_ids: Vec<ObjectId>,
    #[serde(default)]
    pub meta: MetaMap,
}

impl Workspace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            oid: new_oid(),
            version: 0,
            name: name.into(),
            tab_ids: Vec::new(),
            meta: MetaMap::new(),
        }
    }
}

impl StoredObject for Workspace {
    const KIND: ObjectKind = ObjectKind::Workspace;

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
