//! Buffer traversal
//!
//! Walks every leaf of a buffer in layout order, for editors and other tools
//! that work on fields by name. Paths use dots for struct members and brackets
//! for array elements, e.g. `lights[2].pos`.

use crate::layout::ElementKind;

use super::constant_buffer::Buffer;
use super::view::{ConstElementView, ElementView};

/// Callbacks for [`Buffer::accept`]
pub trait BufferVisitor {
    /// Called for every leaf with a writable view of it. Returns whether the
    /// visitor changed the leaf.
    fn visit_leaf(&mut self, path: &str, view: ElementView<'_>) -> bool;

    /// Called before descending into a nested struct; `false` skips it
    fn enter_struct(&mut self, _path: &str) -> bool {
        true
    }

    /// Called before descending into an array of `len` elements; `false` skips it
    fn enter_array(&mut self, _path: &str, _len: usize) -> bool {
        true
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn walk_mut<V: BufferVisitor + ?Sized>(path: &str, mut view: ElementView<'_>, visitor: &mut V) -> bool {
    let element = view.element();
    match element.kind() {
        ElementKind::Leaf(_) => visitor.visit_leaf(path, view),
        ElementKind::Struct(members) => {
            if !path.is_empty() && !visitor.enter_struct(path) {
                return false;
            }
            let mut changed = false;
            for member in members {
                let child = view.reborrow().key(member.name());
                changed |= walk_mut(&child_path(path, member.name()), child, visitor);
            }
            changed
        }
        ElementKind::Array(data) => {
            if !visitor.enter_array(path, data.count()) {
                return false;
            }
            let mut changed = false;
            for i in 0..data.count() {
                let child = view.reborrow().index(i);
                changed |= walk_mut(&format!("{}[{}]", path, i), child, visitor);
            }
            changed
        }
        ElementKind::Empty => false,
    }
}

fn walk<F: FnMut(&str, ConstElementView<'_>)>(path: &str, view: ConstElementView<'_>, f: &mut F) {
    match view.element().kind() {
        ElementKind::Leaf(_) => f(path, view),
        ElementKind::Struct(members) => {
            for member in members {
                walk(&child_path(path, member.name()), view.key(member.name()), f);
            }
        }
        ElementKind::Array(data) => {
            for i in 0..data.count() {
                walk(&format!("{}[{}]", path, i), view.index(i), f);
            }
        }
        ElementKind::Empty => {}
    }
}

impl Buffer {
    /// Walk every leaf with `visitor`. Returns whether any leaf was changed.
    pub fn accept<V: BufferVisitor + ?Sized>(&mut self, visitor: &mut V) -> bool {
        let changed = walk_mut("", self.root_view_mut(), visitor);
        log::trace!("[Buffer] Visitor walk done (changed: {})", changed);
        changed
    }

    /// Call `f` for every leaf, read-only
    pub fn for_each_leaf<F: FnMut(&str, ConstElementView<'_>)>(&self, mut f: F) {
        walk("", self.root_view(), &mut f);
    }
}
