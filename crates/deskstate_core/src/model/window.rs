//! Window record.

use super::block::MetaMap;
use super::object::{new_oid, ObjectId, ObjectKind, StoredObject};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub oid: ObjectId,
    #[serde(default)]
    pub version: i64,
    pub workspace_id: ObjectId,
    /// Must reference an existing tab of `workspace_id`.
    pub active_tab_id: ObjectId,
    #[serde(default)]
    pub meta: MetaMap,
}

impl Window {
    pub fn new(workspace_id: impl Into<ObjectId>, active_tab_id: impl Into<ObjectId>) -> Self {
        Self {
            oid: new_oid(),
            version: 0,
            workspace_id: workspace_id.into(),
            active_tab_id: active_tab_id.into(),
            meta: MetaMap::new(),
        }
    }
}

impl StoredObject for Window {
    const KIND: ObjectKind = ObjectKind::Window;

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
