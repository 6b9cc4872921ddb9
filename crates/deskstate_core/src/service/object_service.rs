//! Block creation use-cases.
//!
//! # Invariants
//! - A block is only created for an existing tab.
//! - The block insert and the append to the owning tab's `block_ids`
//!   commit together or not at all.

use super::error::{ServiceError, ServiceResult};
use crate::model::{Block, BlockDef, CreateBlockData, Tab, ViewTargetOptions};
use crate::repo::{ObjectStore, RequestContext};
use log::info;
use std::sync::Arc;

/// A block created from a [`CreateBlockData`] request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedBlock {
    pub block: Block,
    /// The requester asked for the block to open magnified.
    pub magnified: bool,
}

pub struct ObjectService {
    store: Arc<ObjectStore>,
}

impl ObjectService {
    pub fn new(store: Arc<ObjectStore>) -> Self {
        Self { store }
    }

    /// Creates a block in `tab_id` without notifying any UI.
    ///
    /// Journals two records on success: the created block, then the
    /// updated tab. On failure nothing is stored or journaled.
    pub fn create_block(
        &self,
        ctx: &mut RequestContext,
        tab_id: &str,
        def: &BlockDef,
    ) -> ServiceResult<Block> {
        let (block, _tab) = self
            .store
            .create_attached::<Block, Tab, _>(ctx, Block::from_def(def), tab_id, |tab, block| {
                tab.block_ids.push(block.oid.clone());
            })
            .map_err(ServiceError::store("creating block in tab"))?;

        info!(
            "event=block_create module=service status=ok tab_id={} block_id={} view={}",
            tab_id,
            block.oid,
            def.view().unwrap_or("none")
        );
        Ok(block)
    }

    /// Creates a block that opens `target` (URL or file path).
    ///
    /// # Errors
    /// - `InvalidTarget` when a file target's directory does not exist or the
    ///   path cannot be resolved; nothing is created.
    pub fn create_view_block(
        &self,
        ctx: &mut RequestContext,
        tab_id: &str,
        target: &str,
        options: &ViewTargetOptions,
    ) -> ServiceResult<CreatedBlock> {
        let request = CreateBlockData::for_view_target(target, options)?;
        let block = self.create_block(ctx, tab_id, &request.block_def)?;
        Ok(CreatedBlock {
            block,
            magnified: request.magnified,
        })
    }
}
