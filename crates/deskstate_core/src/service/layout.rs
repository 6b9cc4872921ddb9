//! Portable layout definitions.
//!
//! # Invariants
//! - Every index path is non-empty.
//! - A nested path is issued only after its parent path (all but the last
//!   element) was issued by an earlier step.

use crate::model::block::{
    BlockDef, META_KEY_CONTROLLER, META_KEY_FILE, META_KEY_URL, META_KEY_VIEW,
};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One block placement in a layout bootstrap sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutStep {
    pub index_path: Vec<usize>,
    pub size: Option<u32>,
    pub block_def: BlockDef,
}

impl LayoutStep {
    pub fn new(index_path: Vec<usize>, block_def: BlockDef) -> Self {
        Self {
            index_path,
            size: None,
            block_def,
        }
    }
}

pub type PortableLayout = Vec<LayoutStep>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    EmptyIndexPath {
        step: usize,
    },
    ParentNotInserted {
        step: usize,
        index_path: Vec<usize>,
    },
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIndexPath { step } => write!(f, "step {step} has an empty index path"),
            Self::ParentNotInserted { step, index_path } => write!(
                f,
                "step {step} inserts at {index_path:?} before its parent path exists"
            ),
        }
    }
}

impl Error for LayoutError {}

/// Checks that `steps` are in tree-construction order.
pub fn validate_layout(steps: &[LayoutStep]) -> Result<(), LayoutError> {
    let mut inserted: HashSet<&[usize]> = HashSet::new();
    for (step, layout_step) in steps.iter().enumerate() {
        let path = layout_step.index_path.as_slice();
        let Some((_, parent)) = path.split_last() else {
            return Err(LayoutError::EmptyIndexPath { step });
        };
        if !parent.is_empty() && !inserted.contains(parent) {
            return Err(LayoutError::ParentNotInserted {
                step,
                index_path: path.to_vec(),
            });
        }
        inserted.insert(path);
    }
    Ok(())
}

/// Default layout applied after terms-of-service acceptance.
///
/// Step order is significant and must be kept as is.
pub fn starter_layout() -> PortableLayout {
    vec![
        LayoutStep::new(
            vec![0],
            BlockDef::new()
                .with_meta(META_KEY_VIEW, "term")
                .with_meta(META_KEY_CONTROLLER, "shell"),
        ),
        LayoutStep::new(vec![1], BlockDef::new().with_meta(META_KEY_VIEW, "cpuplot")),
        LayoutStep::new(
            vec![1, 1],
            BlockDef::new()
                .with_meta(META_KEY_VIEW, "web")
                .with_meta(META_KEY_URL, "https://github.com/wavetermdev/waveterm"),
        ),
        LayoutStep::new(
            vec![1, 2],
            BlockDef::new()
                .with_meta(META_KEY_VIEW, "preview")
                .with_meta(META_KEY_FILE, "~"),
        ),
        LayoutStep::new(
            vec![2],
            BlockDef::new()
                .with_meta(META_KEY_VIEW, "term")
                .with_meta(META_KEY_CONTROLLER, "shell"),
        ),
        LayoutStep::new(vec![2, 1], BlockDef::new().with_meta(META_KEY_VIEW, "waveai")),
        LayoutStep::new(
            vec![2, 2],
            BlockDef::new()
                .with_meta(META_KEY_VIEW, "web")
                .with_meta(META_KEY_URL, "https://www.youtube.com/embed/cKqsw_sAsU8"),
        ),
    ]
}
