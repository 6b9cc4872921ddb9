//! Object store, request context and update journal.
//!
//! # Responsibility
//! - Persist typed UI state objects keyed by `(kind, oid)`.
//! - Bound every store call by the caller's deadline.
//! - Record journaled mutations in issuance order.
//!
//! # Invariants
//! - Store mutations append to the context journal only after the write
//!   succeeded.
//! - A context without a journal never accumulates records.

pub mod context;
pub mod journal;
pub mod object_store;

pub use context::RequestContext;
pub use journal::{UpdateBatch, UpdateJournal, UpdateRecord, UpdateType};
pub use object_store::{ObjectStore, StoreError, StoreResult};
