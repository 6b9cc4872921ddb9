//! Request handlers composing the object store and the event bus.
//!
//! # Responsibility
//! - Open deadline-bound contexts for accessor calls.
//! - Run multi-step orchestration (window creation, layout bootstrap).
//!
//! # Invariants
//! - Store errors are wrapped with the failing operation, never retried.
//! - Event delivery failures never fail a request.
//! - Multi-step handlers leave already-applied steps in place on failure.

pub mod client_service;
pub mod error;
pub mod layout;
pub mod object_service;

pub use client_service::ClientService;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use layout::{starter_layout, validate_layout, LayoutError, LayoutStep, PortableLayout};
pub use object_service::{CreatedBlock, ObjectService};
