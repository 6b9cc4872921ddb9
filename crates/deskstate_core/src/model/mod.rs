//! Persisted UI state model.
//!
//! # Responsibility
//! - Define the object kinds kept in the object store.
//! - Declare per-kind identity rules through [`StoredObject`].
//!
//! # Invariants
//! - Every stored object is identified by `(kind, oid)`.
//! - `Client` is a singleton; exactly one instance exists after init.

pub mod block;
pub mod client;
pub mod object;
pub mod tab;
pub mod window;
pub mod workspace;

pub use block::{Block, BlockDef, CreateBlockData, MetaMap, ViewTargetError, ViewTargetOptions};
pub use client::Client;
pub use object::{new_oid, ObjectId, ObjectKind, StoredObject};
pub use tab::Tab;
pub use window::Window;
pub use workspace::Workspace;
