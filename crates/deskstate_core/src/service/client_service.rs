//! Client-facing request handlers.
//!
//! # Responsibility
//! - Accessors for client, workspace, window and tab records.
//! - Window creation and focus ordering.
//! - Terms-of-service acceptance and starter layout bootstrap.
//!
//! # Invariants
//! - `Client.window_ids` never holds duplicates; focus is move-to-front.
//! - Client read-modify-write goes through `modify_singleton`, so concurrent
//!   focus/ToS calls never lose updates.
//! - Layout bootstrap emits one insert event per created block, in step
//!   order, and stops at the first failed step without rollback.

use super::error::{ServiceError, ServiceResult};
use super::layout::{starter_layout, validate_layout, LayoutStep};
use super::object_service::ObjectService;
use crate::config::CoreConfig;
use crate::eventbus::{EventBus, LayoutActionData, LayoutActionType, WindowEvent};
use crate::model::{Client, StoredObject, Tab, Window, Workspace};
use crate::repo::{ObjectStore, RequestContext, StoreError, UpdateBatch};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_WORKSPACE_NAME: &str = "Starter workspace";
const DEFAULT_TAB_NAME: &str = "T1";

pub struct ClientService {
    store: Arc<ObjectStore>,
    bus: Arc<EventBus>,
    objects: ObjectService,
    config: CoreConfig,
}

impl ClientService {
    pub fn new(store: Arc<ObjectStore>, bus: Arc<EventBus>, config: CoreConfig) -> Self {
        Self {
            objects: ObjectService::new(Arc::clone(&store)),
            store,
            bus,
            config,
        }
    }

    /// Opens a context bound by the configured accessor timeout.
    pub fn new_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.config.accessor_timeout())
    }

    pub fn get_client_data(&self) -> ServiceResult<Client> {
        let ctx = self.new_context();
        self.store
            .get_singleton(&ctx)
            .map_err(ServiceError::store("getting client data"))
    }

    pub fn get_workspace(&self, workspace_id: &str) -> ServiceResult<Option<Workspace>> {
        self.get_object(workspace_id, "getting workspace")
    }

    pub fn get_tab(&self, tab_id: &str) -> ServiceResult<Option<Tab>> {
        self.get_object(tab_id, "getting tab")
    }

    pub fn get_window(&self, window_id: &str) -> ServiceResult<Option<Window>> {
        self.get_object(window_id, "getting window")
    }

    fn get_object<T: StoredObject>(
        &self,
        oid: &str,
        operation: &'static str,
    ) -> ServiceResult<Option<T>> {
        let ctx = self.new_context();
        self.store
            .get(&ctx, oid)
            .map_err(ServiceError::store(operation))
    }

    /// Creates the client singleton and a first window when missing.
    ///
    /// Safe to call on every startup.
    pub fn ensure_initial_data(&self, ctx: &mut RequestContext) -> ServiceResult<Client> {
        let client = match self.store.get_singleton::<Client>(ctx) {
            Ok(client) => client,
            Err(StoreError::SingletonMissing(_)) => match self.store.create(ctx, Client::new()) {
                Ok(client) => {
                    info!(
                        "event=client_init module=service status=ok client_id={}",
                        client.oid
                    );
                    client
                }
                // Lost a creation race; the winner's record is authoritative.
                Err(StoreError::AlreadyExists { .. }) => self
                    .store
                    .get_singleton(ctx)
                    .map_err(ServiceError::store("getting client data"))?,
                Err(err) => return Err(ServiceError::store("creating client")(err)),
            },
            Err(err) => return Err(ServiceError::store("getting client data")(err)),
        };

        if !client.window_ids.is_empty() {
            return Ok(client);
        }
        self.make_window(ctx)?;
        self.store
            .get_singleton(ctx)
            .map_err(ServiceError::store("getting client data"))
    }

    /// Creates a workspace with one tab and a window showing that tab, then
    /// registers the window with the client.
    pub fn make_window(&self, ctx: &mut RequestContext) -> ServiceResult<Window> {
        let tab = self
            .store
            .create(ctx, Tab::new(DEFAULT_TAB_NAME))
            .map_err(ServiceError::store("creating tab"))?;

        let mut workspace = Workspace::new(DEFAULT_WORKSPACE_NAME);
        workspace.tab_ids.push(tab.oid.clone());
        let workspace = self
            .store
            .create(ctx, workspace)
            .map_err(ServiceError::store("creating workspace"))?;

        let window = self
            .store
            .create(ctx, Window::new(workspace.oid.as_str(), tab.oid.as_str()))
            .map_err(ServiceError::store("creating window"))?;

        self.store
            .modify_singleton::<Client, _>(ctx, |client| client.add_window(&window.oid))
            .map_err(ServiceError::store("adding window to client"))?;

        info!(
            "event=window_create module=service status=ok window_id={} workspace_id={} tab_id={}",
            window.oid, workspace.oid, tab.oid
        );
        Ok(window)
    }

    /// Moves `window_id` to the front of the client's window list.
    ///
    /// Unknown ids are tolerated and leave the list unchanged.
    pub fn focus_window(&self, ctx: &mut RequestContext, window_id: &str) -> ServiceResult<()> {
        self.store
            .modify_singleton::<Client, _>(ctx, |client| client.focus_window(window_id))
            .map_err(ServiceError::store("updating client data"))?;
        Ok(())
    }

    /// Records terms-of-service acceptance and applies the starter layout.
    ///
    /// Returns every mutation performed, in order. A failed layout bootstrap
    /// is logged and does not fail the acceptance; the batch then holds the
    /// steps that did succeed.
    pub fn agree_tos(&self, ctx: RequestContext) -> ServiceResult<UpdateBatch> {
        let mut ctx = ctx.with_journal();
        let timestamp = now_epoch_ms();
        self.store
            .modify_singleton::<Client, _>(&mut ctx, |client| {
                client.tos_agreed = timestamp;
                true
            })
            .map_err(ServiceError::store("updating client data"))?;

        if let Err(err) = self.bootstrap_starter_layout(&mut ctx) {
            warn!(
                "event=tos_agree module=service status=partial error_code=starter_layout_failed error={}",
                err
            );
        }

        let batch = ctx.drain_journal();
        info!(
            "event=tos_agree module=service status=ok updates={}",
            batch.len()
        );
        Ok(batch)
    }

    pub fn bootstrap_starter_layout(&self, ctx: &mut RequestContext) -> ServiceResult<()> {
        self.bootstrap_layout(ctx, &starter_layout())
    }

    /// Materializes `layout` in the active tab of the most recently focused
    /// window, announcing each block to that window as it is created.
    ///
    /// # Errors
    /// - `InvalidLayout` when steps are not in tree-construction order;
    ///   nothing is created.
    /// - `InvariantViolation` when the client has no windows.
    /// - The first failing block creation; earlier blocks stay persisted and
    ///   announced.
    pub fn bootstrap_layout(
        &self,
        ctx: &mut RequestContext,
        layout: &[LayoutStep],
    ) -> ServiceResult<()> {
        validate_layout(layout)?;
        let timeout = self.config.bootstrap_timeout();
        ctx.scoped(timeout, |ctx| self.apply_layout(ctx, layout))
    }

    fn apply_layout(&self, ctx: &mut RequestContext, layout: &[LayoutStep]) -> ServiceResult<()> {
        let client = self.store.get_singleton::<Client>(ctx).map_err(|err| {
            error!(
                "event=layout_bootstrap module=service status=error error_code=client_missing error={}",
                err
            );
            ServiceError::store("finding client")(err)
        })?;

        let Some(window_id) = client.window_ids.first().cloned() else {
            return Err(ServiceError::InvariantViolation(
                "error bootstrapping layout, no windows exist".to_string(),
            ));
        };

        let window = self
            .store
            .must_get::<Window>(ctx, &window_id)
            .map_err(ServiceError::store("getting window"))?;
        let tab_id = window.active_tab_id;

        for (step, layout_step) in layout.iter().enumerate() {
            let block = self
                .objects
                .create_block(ctx, &tab_id, &layout_step.block_def)
                .map_err(|err| {
                    warn!(
                        "event=layout_bootstrap module=service status=error step={} of={} window_id={} error={}",
                        step + 1,
                        layout.len(),
                        window_id,
                        err
                    );
                    err
                })?;

            self.bus.send_event_to_window(
                &window_id,
                WindowEvent::layout_action(
                    window_id.as_str(),
                    LayoutActionData {
                        action_type: LayoutActionType::InsertAtIndex,
                        tab_id: tab_id.clone(),
                        block_id: block.oid,
                        index_path: layout_step.index_path.clone(),
                        size_hint: layout_step.size,
                    },
                ),
            );
        }

        info!(
            "event=layout_bootstrap module=service status=ok window_id={} tab_id={} steps={}",
            window_id,
            tab_id,
            layout.len()
        );
        Ok(())
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
