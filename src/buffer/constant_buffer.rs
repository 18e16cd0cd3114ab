//! Constant buffer storage

use std::fmt;
use std::sync::Arc;

use glam::Vec4;

use crate::constants::ALIGNMENT;
use crate::error::{fatal, LayoutError, LayoutResult};
use crate::layout::{CookedLayout, LayoutElement, LayoutRegistry, RawLayout};

use super::view::{ConstElementView, ElementView};

/// A block of bytes laid out by a cooked layout.
///
/// The bytes are zero-initialized and stored as 16-byte rows, so every leaf
/// slot is suitably aligned for its CPU type. Cloning copies the bytes and
/// shares the layout.
#[derive(Clone)]
pub struct Buffer {
    root: Arc<LayoutElement>,
    rows: Vec<Vec4>,
}

impl Buffer {
    /// Allocate a zeroed buffer for `layout`
    pub fn new(layout: &CookedLayout) -> Self {
        Self::with_root(layout.share_root())
    }

    /// Intern `raw` through `registry` and allocate a buffer for the result
    pub fn try_from_raw(registry: &LayoutRegistry, mut raw: RawLayout) -> LayoutResult<Self> {
        Ok(Self::from(registry.try_intern(&mut raw)?))
    }

    #[track_caller]
    pub fn from_raw(registry: &LayoutRegistry, raw: RawLayout) -> Self {
        fatal(Self::try_from_raw(registry, raw))
    }

    fn with_root(root: Arc<LayoutElement>) -> Self {
        let size = root.size_in_bytes();
        debug_assert_eq!(size % ALIGNMENT, 0);
        log::trace!("[Buffer] Allocated {} bytes", size);
        Self {
            root,
            rows: vec![Vec4::ZERO; size / ALIGNMENT],
        }
    }

    /// Read-only view of a root member
    #[track_caller]
    pub fn key(&self, name: &str) -> ConstElementView<'_> {
        self.root_view().key(name)
    }

    /// Writable view of a root member
    #[track_caller]
    pub fn key_mut(&mut self, name: &str) -> ElementView<'_> {
        self.root_view_mut().key(name)
    }

    pub fn find(&self, name: &str) -> Option<ConstElementView<'_>> {
        self.root_view().find(name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<ElementView<'_>> {
        self.root_view_mut().find(name)
    }

    /// View of the root struct itself
    pub fn root_view(&self) -> ConstElementView<'_> {
        ConstElementView::new(&self.root, self.data(), 0)
    }

    pub fn root_view_mut(&mut self) -> ElementView<'_> {
        ElementView::new(&self.root, bytemuck::cast_slice_mut(&mut self.rows), 0)
    }

    /// The raw bytes, ready to hand to a graphics API
    pub fn data(&self) -> &[u8] {
        bytemuck::cast_slice(&self.rows)
    }

    pub fn size_in_bytes(&self) -> usize {
        self.rows.len() * ALIGNMENT
    }

    pub fn root_element(&self) -> &LayoutElement {
        &self.root
    }

    /// Another share of this buffer's layout tree
    pub fn share_layout(&self) -> Arc<LayoutElement> {
        Arc::clone(&self.root)
    }

    /// This buffer's layout, for creating more buffers of the same shape
    pub fn layout(&self) -> CookedLayout {
        CookedLayout::new(self.share_layout())
    }

    /// Whether `other` was built from the same interned layout
    pub fn is_compatible(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    fn ensure_compatible(&self, other: &Buffer) -> LayoutResult<()> {
        if self.is_compatible(other) {
            return Ok(());
        }
        Err(LayoutError::IncompatibleLayout {
            ours: self.root.try_signature()?,
            theirs: other.root.try_signature()?,
        })
    }

    /// Copy the contents of another buffer with the same layout
    pub fn try_copy_from(&mut self, other: &Buffer) -> LayoutResult<()> {
        self.ensure_compatible(other)?;
        self.rows.copy_from_slice(&other.rows);
        Ok(())
    }

    #[track_caller]
    pub fn copy_from(&mut self, other: &Buffer) {
        fatal(self.try_copy_from(other))
    }

    /// Take over the storage of another buffer with the same layout
    pub fn try_move_from(&mut self, other: Buffer) -> LayoutResult<()> {
        self.ensure_compatible(&other)?;
        self.rows = other.rows;
        Ok(())
    }

    #[track_caller]
    pub fn move_from(&mut self, other: Buffer) {
        fatal(self.try_move_from(other))
    }
}

impl From<CookedLayout> for Buffer {
    fn from(layout: CookedLayout) -> Self {
        Self::with_root(layout.take_root())
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("signature", &self.root.try_signature().unwrap_or_default())
            .field("size_in_bytes", &self.size_in_bytes())
            .finish()
    }
}
