//! Core state layer for desktop UI objects: windows, tabs, workspaces,
//! blocks and the client singleton.
//!
//! Mutations run through a deadline-bound [`RequestContext`]; journaled
//! contexts collect them into an ordered [`UpdateBatch`] for replication,
//! and the [`EventBus`] pushes layout events to open windows.

pub mod config;
pub mod db;
pub mod eventbus;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use eventbus::{EventBus, EventData, LayoutActionData, LayoutActionType, WindowEvent};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::{
    Block, BlockDef, Client, CreateBlockData, MetaMap, ObjectId, ObjectKind, StoredObject, Tab,
    ViewTargetError, ViewTargetOptions, Window, Workspace,
};
pub use repo::{
    ObjectStore, RequestContext, StoreError, StoreResult, UpdateBatch, UpdateJournal,
    UpdateRecord, UpdateType,
};
pub use service::{
    starter_layout, validate_layout, ClientService, CreatedBlock, ErrorKind, LayoutError,
    LayoutStep, ObjectService, PortableLayout, ServiceError, ServiceResult,
};
