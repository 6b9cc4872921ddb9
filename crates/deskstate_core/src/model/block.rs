//! Block record and its creation definition.
//!
//! # Responsibility
//! - Hold the leaf content unit rendered inside a tab layout.
//! - Build block definitions for "open this target" requests.
//!
//! # Invariants
//! - `meta` is opaque to the core beyond the well-known keys below; it is
//!   passed through to storage unchanged.

use super::object::{new_oid, ObjectId, ObjectKind, StoredObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Heterogeneous metadata keyed by string.
pub type MetaMap = BTreeMap<String, Value>;

pub const META_KEY_VIEW: &str = "view";
pub const META_KEY_CONTROLLER: &str = "controller";
pub const META_KEY_URL: &str = "url";
pub const META_KEY_FILE: &str = "file";
pub const META_KEY_CONNECTION: &str = "connection";
pub const META_KEY_EDIT: &str = "edit";

/// Input used to create a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockDef {
    #[serde(default)]
    pub meta: MetaMap,
}

/// Block creation request: the definition plus how to present it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockData {
    pub block_def: BlockDef,
    #[serde(default)]
    pub magnified: bool,
}

/// Flags for [`BlockDef::for_view_target`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewTargetOptions {
    /// Open the file in edit mode (ignored for URLs).
    pub edit: bool,
    /// Remote connection name; empty means local.
    pub connection: String,
    /// Open the new block magnified.
    pub magnified: bool,
}

/// Why a view target could not be turned into a block definition.
#[derive(Debug)]
pub enum ViewTargetError {
    /// The path could not be made absolute or its parent inspected.
    Resolve(io::Error),
    /// The target's parent directory does not exist.
    ParentMissing(PathBuf),
}

impl Display for ViewTargetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolve(err) => write!(f, "cannot resolve view target: {err}"),
            Self::ParentMissing(parent) => {
                write!(f, "parent directory does not exist: {}", parent.display())
            }
        }
    }
}

impl Error for ViewTargetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Resolve(err) => Some(err),
            Self::ParentMissing(_) => None,
        }
    }
}

impl From<io::Error> for ViewTargetError {
    fn from(value: io::Error) -> Self {
        Self::Resolve(value)
    }
}

impl BlockDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style meta insertion.
    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    /// Returns the `view` meta value when it is a string.
    pub fn view(&self) -> Option<&str> {
        self.meta.get(META_KEY_VIEW).and_then(Value::as_str)
    }

    /// Builds a definition that opens `target`.
    ///
    /// `http://` and `https://` targets become a `web` view. Anything else is
    /// treated as a file path and becomes a `preview` view over its absolute
    /// path; the file itself may not exist yet, but its directory must.
    ///
    /// # Errors
    /// - `ParentMissing` when the file's directory does not exist.
    /// - `Resolve` when the path cannot be made absolute or its parent
    ///   cannot be inspected.
    pub fn for_view_target(
        target: &str,
        options: &ViewTargetOptions,
    ) -> Result<Self, ViewTargetError> {
        if target.starts_with("http://") || target.starts_with("https://") {
            return Ok(Self::new()
                .with_meta(META_KEY_VIEW, "web")
                .with_meta(META_KEY_URL, target));
        }

        let absolute = std::path::absolute(Path::new(target))?;
        if let Some(parent) = absolute.parent() {
            match fs::metadata(parent) {
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    return Err(ViewTargetError::ParentMissing(parent.to_path_buf()));
                }
                Err(err) => return Err(ViewTargetError::Resolve(err)),
            }
        }

        let mut def = Self::new()
            .with_meta(META_KEY_VIEW, "preview")
            .with_meta(META_KEY_FILE, absolute.to_string_lossy().into_owned());
        if options.edit {
            def = def.with_meta(META_KEY_EDIT, true);
        }
        if !options.connection.is_empty() {
            def = def.with_meta(META_KEY_CONNECTION, options.connection.as_str());
        }
        Ok(def)
    }
}

impl CreateBlockData {
    /// [`BlockDef::for_view_target`] plus the presentation flags in `options`.
    pub fn for_view_target(
        target: &str,
        options: &ViewTargetOptions,
    ) -> Result<Self, ViewTargetError> {
        Ok(Self {
            block_def: BlockDef::for_view_target(target, options)?,
            magnified: options.magnified,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub oid: ObjectId,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub meta: MetaMap,
}

impl Block {
    /// Creates a block with a fresh id from its definition.
    pub fn from_def(def: &BlockDef) -> Self {
        Self {
            oid: new_oid(),
            version: 0,
            meta: def.meta.clone(),
        }
    }
}

impl StoredObject for Block {
    const KIND: ObjectKind = ObjectKind::Block;

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
