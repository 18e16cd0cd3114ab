//! Cooked (finalized) layouts

use std::sync::Arc;

use crate::error::LayoutResult;
use crate::layout::describe::LayoutDescription;
use crate::layout::element::LayoutElement;

/// A committed, immutable layout.
///
/// Only the registry creates these. Every cooked layout for the same schema
/// shares one tree, so buffers can compare layouts by pointer.
#[derive(Debug, Clone)]
pub struct CookedLayout {
    root: Arc<LayoutElement>,
}

impl CookedLayout {
    pub(crate) fn new(root: Arc<LayoutElement>) -> Self {
        Self { root }
    }

    /// Key into the root struct (read-only)
    #[track_caller]
    pub fn key(&self, name: &str) -> &LayoutElement {
        self.root.key(name)
    }

    pub fn root(&self) -> &LayoutElement {
        &self.root
    }

    pub fn size_in_bytes(&self) -> usize {
        self.root.size_in_bytes()
    }

    pub fn signature(&self) -> String {
        self.root.signature()
    }

    /// Get another share of the tree
    pub fn share_root(&self) -> Arc<LayoutElement> {
        Arc::clone(&self.root)
    }

    /// Give up this share of the tree to the caller
    pub fn take_root(self) -> Arc<LayoutElement> {
        self.root
    }

    /// Whether both layouts point at the same tree
    pub fn shares_root_with(&self, other: &CookedLayout) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    /// Offset table of every field
    pub fn describe(&self) -> LayoutResult<LayoutDescription> {
        LayoutDescription::of(&self.root)
    }
}
