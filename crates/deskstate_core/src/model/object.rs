//! Object identity and kind dispatch.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque object identifier (UUID v4 text).
pub type ObjectId = String;

/// Allocates a fresh object identifier.
pub fn new_oid() -> ObjectId {
    Uuid::new_v4().to_string()
}

/// Kind tag stored next to every persisted object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Client,
    Window,
    Workspace,
    Tab,
    Block,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Window => "window",
            Self::Workspace => "workspace",
            Self::Tab => "tab",
            Self::Block => "block",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "client" => Some(Self::Client),
            "window" => Some(Self::Window),
            "workspace" => Some(Self::Workspace),
            "tab" => Some(Self::Tab),
            "block" => Some(Self::Block),
            _ => None,
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract implemented by every kind the object store persists.
///
/// # Invariants
/// - `KIND` is unique per implementing type.
/// - `version` is owned by the store: it is `1` after create and grows by one
///   on every successful write. Callers must not bump it themselves.
pub trait StoredObject: Serialize + DeserializeOwned + Clone {
    const KIND: ObjectKind;
    /// Singleton kinds are resolved with `get_singleton` instead of an id.
    const SINGLETON: bool = false;

    fn oid(&self) -> &str;
    fn version(&self) -> i64;
    fn set_version(&mut self, version: i64);
}
