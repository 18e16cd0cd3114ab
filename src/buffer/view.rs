//! Element views
//!
//! Views are the proxies you get by keying or indexing into a [`Buffer`]:
//! a layout node, the buffer's bytes, and the offset accumulated by stepping
//! through arrays. They can be keyed and indexed further, and converted to
//! and from the catalog's CPU types.
//!
//! [`Buffer`]: crate::buffer::Buffer

use std::fmt;
use std::ops::Range;

use crate::error::{fatal, wrong_kind, LayoutError, LayoutResult};
use crate::layout::{LayoutElement, LeafData, LeafType, LeafValue, PodLeaf};

/// Byte range of a leaf accessed as `T`
fn leaf_range<T: LeafValue>(element: &LayoutElement, array_offset: usize) -> LayoutResult<Range<usize>> {
    let start = array_offset + element.try_leaf_offset::<T>()?;
    Ok(start..start + T::LEAF_TYPE.gpu_size())
}

/// Byte range of whatever leaf `element` is
fn any_leaf_range(element: &LayoutElement, array_offset: usize) -> LayoutResult<(LeafType, Range<usize>)> {
    let leaf = element
        .leaf_type()
        .ok_or_else(|| wrong_kind("read or write", "leaf", element.kind().name()))?;
    let start = array_offset + element.try_offset_begin()?;
    Ok((leaf, start..start + leaf.gpu_size()))
}

/// Read-only view into a buffer
#[derive(Clone, Copy)]
pub struct ConstElementView<'a> {
    element: &'a LayoutElement,
    bytes: &'a [u8],
    array_offset: usize,
}

impl<'a> ConstElementView<'a> {
    pub(crate) fn new(element: &'a LayoutElement, bytes: &'a [u8], array_offset: usize) -> Self {
        Self {
            element,
            bytes,
            array_offset,
        }
    }

    /// False if this view came from a lookup that found nothing
    pub fn is_valid(&self) -> bool {
        self.element.is_valid()
    }

    pub fn element(&self) -> &'a LayoutElement {
        self.element
    }

    /// Extra offset accumulated by indexing into arrays
    pub fn array_offset(&self) -> usize {
        self.array_offset
    }

    pub fn try_key(&self, name: &str) -> LayoutResult<ConstElementView<'a>> {
        Ok(Self::new(self.element.try_key(name)?, self.bytes, self.array_offset))
    }

    #[track_caller]
    pub fn key(&self, name: &str) -> ConstElementView<'a> {
        fatal(self.try_key(name))
    }

    /// `Some` only if the member exists
    pub fn find(&self, name: &str) -> Option<ConstElementView<'a>> {
        self.try_key(name).ok().filter(|view| view.is_valid())
    }

    pub fn try_index(&self, index: usize) -> LayoutResult<ConstElementView<'a>> {
        let (array_offset, template) = self.element.try_index_offset(self.array_offset, index)?;
        Ok(Self::new(template, self.bytes, array_offset))
    }

    #[track_caller]
    pub fn index(&self, index: usize) -> ConstElementView<'a> {
        fatal(self.try_index(index))
    }

    pub fn try_get<T: LeafValue>(&self) -> LayoutResult<T> {
        let range = leaf_range::<T>(self.element, self.array_offset)?;
        Ok(T::read_bytes(&self.bytes[range]))
    }

    /// Read the leaf as `T`; fatal if the leaf is of another type
    #[track_caller]
    pub fn get<T: LeafValue>(&self) -> T {
        fatal(self.try_get())
    }

    pub fn try_value(&self) -> LayoutResult<LeafData> {
        let (leaf, range) = any_leaf_range(self.element, self.array_offset)?;
        Ok(LeafData::read(leaf, &self.bytes[range]))
    }

    /// Read the leaf without naming its type
    #[track_caller]
    pub fn value(&self) -> LeafData {
        fatal(self.try_value())
    }

    pub fn try_leaf_ref<T: PodLeaf>(&self) -> LayoutResult<&'a T> {
        let range = leaf_range::<T>(self.element, self.array_offset)?;
        Ok(bytemuck::from_bytes(&self.bytes[range]))
    }

    /// Borrow the leaf's bytes in place as `T`
    #[track_caller]
    pub fn leaf_ref<T: PodLeaf>(&self) -> &'a T {
        fatal(self.try_leaf_ref())
    }
}

impl fmt::Debug for ConstElementView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstElementView")
            .field("element", &self.element.element_type())
            .field("array_offset", &self.array_offset)
            .finish()
    }
}

/// Read/write view into a buffer.
///
/// Keying and indexing consume the view, so chains read naturally:
/// `buffer.key_mut("lights").index(2).key("pos").set(pos)`. Use
/// [`reborrow`](Self::reborrow) to keep a view around while stepping into it.
pub struct ElementView<'a> {
    element: &'a LayoutElement,
    bytes: &'a mut [u8],
    array_offset: usize,
}

impl<'a> ElementView<'a> {
    pub(crate) fn new(element: &'a LayoutElement, bytes: &'a mut [u8], array_offset: usize) -> Self {
        Self {
            element,
            bytes,
            array_offset,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.element.is_valid()
    }

    pub fn element(&self) -> &'a LayoutElement {
        self.element
    }

    pub fn array_offset(&self) -> usize {
        self.array_offset
    }

    /// Shorter-lived view of the same element
    pub fn reborrow(&mut self) -> ElementView<'_> {
        ElementView {
            element: self.element,
            bytes: &mut *self.bytes,
            array_offset: self.array_offset,
        }
    }

    pub fn as_const(&self) -> ConstElementView<'_> {
        ConstElementView::new(self.element, &*self.bytes, self.array_offset)
    }

    pub fn try_key(self, name: &str) -> LayoutResult<ElementView<'a>> {
        let element = self.element.try_key(name)?;
        Ok(Self::new(element, self.bytes, self.array_offset))
    }

    #[track_caller]
    pub fn key(self, name: &str) -> ElementView<'a> {
        fatal(self.try_key(name))
    }

    pub fn find(self, name: &str) -> Option<ElementView<'a>> {
        self.try_key(name).ok().filter(|view| view.is_valid())
    }

    pub fn try_index(self, index: usize) -> LayoutResult<ElementView<'a>> {
        let (array_offset, template) = self.element.try_index_offset(self.array_offset, index)?;
        Ok(Self::new(template, self.bytes, array_offset))
    }

    #[track_caller]
    pub fn index(self, index: usize) -> ElementView<'a> {
        fatal(self.try_index(index))
    }

    pub fn try_get<T: LeafValue>(&self) -> LayoutResult<T> {
        self.as_const().try_get()
    }

    #[track_caller]
    pub fn get<T: LeafValue>(&self) -> T {
        fatal(self.try_get())
    }

    pub fn try_value(&self) -> LayoutResult<LeafData> {
        self.as_const().try_value()
    }

    #[track_caller]
    pub fn value(&self) -> LeafData {
        fatal(self.try_value())
    }

    pub fn try_set<T: LeafValue>(&mut self, value: T) -> LayoutResult<()> {
        let range = leaf_range::<T>(self.element, self.array_offset)?;
        value.write_bytes(&mut self.bytes[range]);
        Ok(())
    }

    /// Write the leaf as `T`; fatal if the leaf is of another type
    #[track_caller]
    pub fn set<T: LeafValue>(&mut self, value: T) {
        fatal(self.try_set(value))
    }

    /// Write only if this view refers to a real element. Returns whether the
    /// write happened; a type mismatch on a real element is still fatal.
    #[track_caller]
    pub fn set_if_valid<T: LeafValue>(&mut self, value: T) -> bool {
        if !self.is_valid() {
            return false;
        }
        self.set(value);
        true
    }

    pub fn try_set_value(&mut self, value: LeafData) -> LayoutResult<()> {
        let (leaf, range) = any_leaf_range(self.element, self.array_offset)?;
        if leaf != value.leaf_type() {
            return Err(LayoutError::TypeMismatch {
                actual: leaf,
                requested: value.leaf_type(),
            });
        }
        value.write(&mut self.bytes[range]);
        Ok(())
    }

    #[track_caller]
    pub fn set_value(&mut self, value: LeafData) {
        fatal(self.try_set_value(value))
    }

    pub fn try_leaf_mut<T: PodLeaf>(self) -> LayoutResult<&'a mut T> {
        let range = leaf_range::<T>(self.element, self.array_offset)?;
        Ok(bytemuck::from_bytes_mut(&mut self.bytes[range]))
    }

    /// Borrow the leaf's bytes in place as `&mut T`, for code that wants a
    /// plain reference (editor widgets and the like)
    #[track_caller]
    pub fn leaf_mut<T: PodLeaf>(self) -> &'a mut T {
        fatal(self.try_leaf_mut())
    }
}

impl<'a> From<ElementView<'a>> for ConstElementView<'a> {
    fn from(view: ElementView<'a>) -> Self {
        ConstElementView::new(view.element, view.bytes, view.array_offset)
    }
}

impl fmt::Debug for ElementView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementView")
            .field("element", &self.element.element_type())
            .field("array_offset", &self.array_offset)
            .finish()
    }
}
