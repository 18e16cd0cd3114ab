//! Layout element tree
//!
//! A schema is a tree of [`LayoutElement`]s: structs hold named, ordered
//! members, arrays hold one element template plus a count, and leaves are one
//! of the catalog's [`LeafType`]s. Offsets are assigned once by `commit` and
//! never change afterwards.
//!
//! A failed lookup returns the shared empty element instead of failing, so
//! callers can probe for optional fields with [`LayoutElement::is_valid`].

use crate::error::{fatal, wrong_kind, LayoutError, LayoutResult};
use crate::layout::leaf::{LeafType, LeafValue};
use crate::layout::packing::{
    advance_if_crosses_boundary, advance_to_boundary, checked_advance_to_boundary,
};

/// Kind of element to create when adding a struct member or setting an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Leaf(LeafType),
    Struct,
    Array,
}

impl From<LeafType> for ElementType {
    fn from(leaf: LeafType) -> Self {
        ElementType::Leaf(leaf)
    }
}

/// Named member of a struct element
#[derive(Debug, Clone)]
pub struct Member {
    name: String,
    element: LayoutElement,
}

impl Member {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element(&self) -> &LayoutElement {
        &self.element
    }
}

/// Template and element count of an array element
#[derive(Debug, Clone)]
pub struct ArrayData {
    template: Option<Box<LayoutElement>>,
    count: usize,
    /// Distance between consecutive elements, known after commit
    stride: usize,
}

impl ArrayData {
    /// Element template, `None` until the array has been set
    pub fn template(&self) -> Option<&LayoutElement> {
        self.template.as_deref()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn stride(&self) -> usize {
        self.stride
    }
}

/// Node payload
#[derive(Debug, Clone)]
pub enum ElementKind {
    Leaf(LeafType),
    Struct(Vec<Member>),
    Array(ArrayData),
    /// Returned by lookups that found nothing
    Empty,
}

impl ElementKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            ElementKind::Leaf(_) => "leaf",
            ElementKind::Struct(_) => "struct",
            ElementKind::Array(_) => "array",
            ElementKind::Empty => "empty",
        }
    }
}

/// One node of a layout tree
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Byte offset from the start of the buffer; `None` until committed
    offset: Option<usize>,
    kind: ElementKind,
}

static EMPTY_ELEMENT: LayoutElement = LayoutElement {
    offset: None,
    kind: ElementKind::Empty,
};

/// Largest offset a committed layout may reach; no allocation can be larger
const MAX_LAYOUT_END: usize = isize::MAX as usize;

/// First offset after `len` bytes at `offset`, if it is addressable
fn checked_end(offset: usize, len: usize) -> LayoutResult<usize> {
    offset
        .checked_add(len)
        .filter(|end| *end <= MAX_LAYOUT_END)
        .ok_or(LayoutError::LayoutTooLarge)
}

/// Next row boundary at or after `offset`, if it is addressable
fn row_start(offset: usize) -> LayoutResult<usize> {
    checked_advance_to_boundary(offset)
        .filter(|start| *start <= MAX_LAYOUT_END)
        .ok_or(LayoutError::LayoutTooLarge)
}

/// Check a string for validity as a struct member name
pub fn is_valid_member_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

impl LayoutElement {
    pub(crate) fn new(ty: ElementType) -> Self {
        let kind = match ty {
            ElementType::Leaf(leaf) => ElementKind::Leaf(leaf),
            ElementType::Struct => ElementKind::Struct(Vec::new()),
            ElementType::Array => ElementKind::Array(ArrayData {
                template: None,
                count: 0,
                stride: 0,
            }),
        };

        Self { offset: None, kind }
    }

    /// The shared "not found" element
    pub fn empty() -> &'static LayoutElement {
        &EMPTY_ELEMENT
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// `None` for the empty element
    pub fn element_type(&self) -> Option<ElementType> {
        match &self.kind {
            ElementKind::Leaf(leaf) => Some(ElementType::Leaf(*leaf)),
            ElementKind::Struct(_) => Some(ElementType::Struct),
            ElementKind::Array(_) => Some(ElementType::Array),
            ElementKind::Empty => None,
        }
    }

    pub fn leaf_type(&self) -> Option<LeafType> {
        match &self.kind {
            ElementKind::Leaf(leaf) => Some(*leaf),
            _ => None,
        }
    }

    /// True for every element except the empty sentinel
    pub fn is_valid(&self) -> bool {
        !matches!(self.kind, ElementKind::Empty)
    }

    pub fn is_committed(&self) -> bool {
        self.offset.is_some()
    }

    /// Struct members in declaration order (empty for other kinds)
    pub fn members(&self) -> &[Member] {
        match &self.kind {
            ElementKind::Struct(members) => members,
            _ => &[],
        }
    }

    pub fn array_len(&self) -> Option<usize> {
        match &self.kind {
            ElementKind::Array(data) => Some(data.count),
            _ => None,
        }
    }

    /// Look up a struct member by name.
    ///
    /// A missing member yields the empty element, and so does keying into the
    /// empty element itself. Keying into a leaf or an array is an error.
    pub fn try_key(&self, name: &str) -> LayoutResult<&LayoutElement> {
        match &self.kind {
            ElementKind::Struct(members) => Ok(members
                .iter()
                .find(|member| member.name == name)
                .map_or(&EMPTY_ELEMENT, |member| &member.element)),
            ElementKind::Empty => Ok(&EMPTY_ELEMENT),
            other => Err(wrong_kind("key into", "struct", other.name())),
        }
    }

    #[track_caller]
    pub fn key(&self, name: &str) -> &LayoutElement {
        fatal(self.try_key(name))
    }

    /// Non-fatal lookup: `None` if the member is absent or this is not a struct
    pub fn find(&self, name: &str) -> Option<&LayoutElement> {
        self.try_key(name).ok().filter(|element| element.is_valid())
    }

    /// Mutable member lookup while building. A missing member is an error here,
    /// since there is nothing to build on.
    pub fn try_key_mut(&mut self, name: &str) -> LayoutResult<&mut LayoutElement> {
        self.ensure_uncommitted()?;
        let found = self.kind.name();
        let ElementKind::Struct(members) = &mut self.kind else {
            return Err(wrong_kind("key into", "struct", found));
        };

        members
            .iter_mut()
            .find(|member| member.name == name)
            .map(|member| &mut member.element)
            .ok_or_else(|| LayoutError::MissingMember {
                name: name.to_string(),
            })
    }

    #[track_caller]
    pub fn key_mut(&mut self, name: &str) -> &mut LayoutElement {
        fatal(self.try_key_mut(name))
    }

    /// Element template of an array
    pub fn try_template(&self) -> LayoutResult<&LayoutElement> {
        match &self.kind {
            ElementKind::Array(data) => data.template.as_deref().ok_or(LayoutError::ArrayUnset),
            other => Err(wrong_kind("get the template of", "array", other.name())),
        }
    }

    #[track_caller]
    pub fn template(&self) -> &LayoutElement {
        fatal(self.try_template())
    }

    pub fn try_template_mut(&mut self) -> LayoutResult<&mut LayoutElement> {
        self.ensure_uncommitted()?;
        match &mut self.kind {
            ElementKind::Array(data) => data
                .template
                .as_deref_mut()
                .ok_or(LayoutError::ArrayUnset),
            other => Err(wrong_kind("get the template of", "array", other.name())),
        }
    }

    #[track_caller]
    pub fn template_mut(&mut self) -> &mut LayoutElement {
        fatal(self.try_template_mut())
    }

    /// Append a member to a struct. Returns the struct so calls can chain.
    pub fn try_add(
        &mut self,
        ty: impl Into<ElementType>,
        name: impl Into<String>,
    ) -> LayoutResult<&mut Self> {
        let name = name.into();
        self.ensure_uncommitted()?;
        let found = self.kind.name();
        let ElementKind::Struct(members) = &mut self.kind else {
            return Err(wrong_kind("add a member to", "struct", found));
        };

        if !is_valid_member_name(&name) {
            return Err(LayoutError::InvalidName { name });
        }
        if members.iter().any(|member| member.name == name) {
            return Err(LayoutError::DuplicateName { name });
        }

        members.push(Member {
            name,
            element: LayoutElement::new(ty.into()),
        });
        Ok(self)
    }

    #[track_caller]
    pub fn add(&mut self, ty: impl Into<ElementType>, name: impl Into<String>) -> &mut Self {
        fatal(self.try_add(ty, name))
    }

    /// Set the element type and count of an array. Can only be done once.
    pub fn try_set_array(&mut self, ty: impl Into<ElementType>, count: usize) -> LayoutResult<&mut Self> {
        self.ensure_uncommitted()?;
        let found = self.kind.name();
        let ElementKind::Array(data) = &mut self.kind else {
            return Err(wrong_kind("set the element type of", "array", found));
        };

        if count == 0 {
            return Err(LayoutError::ZeroLengthArray);
        }
        if data.template.is_some() {
            return Err(LayoutError::ArrayAlreadySet);
        }

        data.template = Some(Box::new(LayoutElement::new(ty.into())));
        data.count = count;
        Ok(self)
    }

    #[track_caller]
    pub fn set_array(&mut self, ty: impl Into<ElementType>, count: usize) -> &mut Self {
        fatal(self.try_set_array(ty, count))
    }

    /// Canonical text describing this element's shape.
    ///
    /// Leaves give their tag, structs `St{name:sig;...}` and arrays
    /// `Ar:<count>{sig}`. Offsets play no part, so the signature of an
    /// uncommitted tree equals that of its committed form.
    pub fn try_signature(&self) -> LayoutResult<String> {
        let mut signature = String::new();
        self.write_signature(&mut signature)?;
        Ok(signature)
    }

    #[track_caller]
    pub fn signature(&self) -> String {
        fatal(self.try_signature())
    }

    fn write_signature(&self, out: &mut String) -> LayoutResult<()> {
        match &self.kind {
            ElementKind::Leaf(leaf) => out.push_str(leaf.tag()),
            ElementKind::Struct(members) => {
                out.push_str("St{");
                for member in members {
                    out.push_str(&member.name);
                    out.push(':');
                    member.element.write_signature(out)?;
                    out.push(';');
                }
                out.push('}');
            }
            ElementKind::Array(data) => {
                let template = data.template.as_deref().ok_or(LayoutError::ArrayUnset)?;
                out.push_str("Ar:");
                out.push_str(&data.count.to_string());
                out.push('{');
                template.write_signature(out)?;
                out.push('}');
            }
            ElementKind::Empty => return Err(wrong_kind("sign", "leaf, struct or array", "empty")),
        }
        Ok(())
    }

    /// Assign offsets to this element and everything below it, starting at
    /// `offset_in`. Returns the first offset after the element.
    pub(crate) fn commit(&mut self, offset_in: usize) -> LayoutResult<usize> {
        if self.offset.is_some() {
            return Err(LayoutError::AlreadyCommitted);
        }

        match &mut self.kind {
            ElementKind::Leaf(leaf) => {
                let size = leaf.gpu_size();
                let offset =
                    advance_if_crosses_boundary(offset_in, size).ok_or(LayoutError::LayoutTooLarge)?;
                self.offset = Some(offset);
                checked_end(offset, size)
            }
            ElementKind::Struct(members) => {
                if members.is_empty() {
                    return Err(LayoutError::EmptyStruct);
                }
                let offset = row_start(offset_in)?;
                let mut next = offset;
                for member in members.iter_mut() {
                    next = member.element.commit(next)?;
                }
                self.offset = Some(offset);
                // The struct owns its trailing row
                row_start(next)
            }
            ElementKind::Array(data) => {
                if data.count == 0 {
                    return Err(LayoutError::ZeroLengthArray);
                }
                let template = data.template.as_deref_mut().ok_or(LayoutError::ArrayUnset)?;
                let offset = row_start(offset_in)?;
                let template_end = template.commit(offset)?;
                data.stride = row_start(template_end - offset)?;
                self.offset = Some(offset);
                let span = data
                    .stride
                    .checked_mul(data.count)
                    .ok_or(LayoutError::LayoutTooLarge)?;
                checked_end(offset, span)
            }
            ElementKind::Empty => Err(wrong_kind("commit", "leaf, struct or array", "empty")),
        }
    }

    pub fn try_offset_begin(&self) -> LayoutResult<usize> {
        if !self.is_valid() {
            return Err(wrong_kind("get the offset of", "leaf, struct or array", "empty"));
        }
        self.offset.ok_or(LayoutError::NotCommitted)
    }

    #[track_caller]
    pub fn offset_begin(&self) -> usize {
        fatal(self.try_offset_begin())
    }

    pub fn try_offset_end(&self) -> LayoutResult<usize> {
        let begin = self.try_offset_begin()?;
        match &self.kind {
            ElementKind::Leaf(leaf) => Ok(begin + leaf.gpu_size()),
            ElementKind::Struct(members) => match members.last() {
                Some(last) => Ok(advance_to_boundary(last.element.try_offset_end()?)),
                None => Ok(begin),
            },
            ElementKind::Array(data) => Ok(begin + data.stride * data.count),
            ElementKind::Empty => Err(LayoutError::NotCommitted),
        }
    }

    #[track_caller]
    pub fn offset_end(&self) -> usize {
        fatal(self.try_offset_end())
    }

    pub fn try_size_in_bytes(&self) -> LayoutResult<usize> {
        Ok(self.try_offset_end()? - self.try_offset_begin()?)
    }

    #[track_caller]
    pub fn size_in_bytes(&self) -> usize {
        fatal(self.try_size_in_bytes())
    }

    /// Offset of a leaf read or written as `T`, type-checked against the catalog
    pub fn try_leaf_offset<T: LeafValue>(&self) -> LayoutResult<usize> {
        match &self.kind {
            ElementKind::Leaf(actual) if *actual == T::LEAF_TYPE => self.try_offset_begin(),
            ElementKind::Leaf(actual) => Err(LayoutError::TypeMismatch {
                actual: *actual,
                requested: T::LEAF_TYPE,
            }),
            other => Err(wrong_kind("read or write", "leaf", other.name())),
        }
    }

    #[track_caller]
    pub fn leaf_offset<T: LeafValue>(&self) -> usize {
        fatal(self.try_leaf_offset::<T>())
    }

    /// Step into element `index` of an array. `base` is the array offset
    /// accumulated so far; returns the new accumulated offset and the template.
    pub(crate) fn try_index_offset(
        &self,
        base: usize,
        index: usize,
    ) -> LayoutResult<(usize, &LayoutElement)> {
        let ElementKind::Array(data) = &self.kind else {
            return Err(wrong_kind("index into", "array", self.kind.name()));
        };
        let template = data.template.as_deref().ok_or(LayoutError::ArrayUnset)?;
        if index >= data.count {
            return Err(LayoutError::IndexOutOfBounds {
                index,
                len: data.count,
            });
        }
        Ok((base + data.stride * index, template))
    }

    fn ensure_uncommitted(&self) -> LayoutResult<()> {
        if self.offset.is_some() {
            Err(LayoutError::AlreadyCommitted)
        } else {
            Ok(())
        }
    }
}
