//! Raw (builder) layouts

use crate::error::{fatal, LayoutResult};
use crate::layout::element::{ElementType, LayoutElement};

/// A layout that is still being built.
///
/// Holds an uncommitted tree rooted at a struct. Hand it to
/// [`LayoutRegistry::intern`](crate::layout::LayoutRegistry::intern) to get a
/// [`CookedLayout`](crate::layout::CookedLayout); after that the raw layout is
/// reset to an empty struct and can be reused for another schema.
#[derive(Debug, Clone)]
pub struct RawLayout {
    root: LayoutElement,
}

impl Default for RawLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl RawLayout {
    pub fn new() -> Self {
        Self {
            root: LayoutElement::new(ElementType::Struct),
        }
    }

    /// Add a member to the root struct
    #[track_caller]
    pub fn add(&mut self, ty: impl Into<ElementType>, name: impl Into<String>) -> &mut LayoutElement {
        self.root.add(ty, name)
    }

    pub fn try_add(
        &mut self,
        ty: impl Into<ElementType>,
        name: impl Into<String>,
    ) -> LayoutResult<&mut LayoutElement> {
        self.root.try_add(ty, name)
    }

    /// Key into the root struct
    #[track_caller]
    pub fn key(&self, name: &str) -> &LayoutElement {
        self.root.key(name)
    }

    /// Key into the root struct to keep building a nested member
    #[track_caller]
    pub fn key_mut(&mut self, name: &str) -> &mut LayoutElement {
        self.root.key_mut(name)
    }

    pub fn try_key_mut(&mut self, name: &str) -> LayoutResult<&mut LayoutElement> {
        self.root.try_key_mut(name)
    }

    pub fn root(&self) -> &LayoutElement {
        &self.root
    }

    /// True while the root struct has no members
    pub fn is_empty(&self) -> bool {
        self.root.members().is_empty()
    }

    pub fn try_signature(&self) -> LayoutResult<String> {
        self.root.try_signature()
    }

    #[track_caller]
    pub fn signature(&self) -> String {
        fatal(self.try_signature())
    }

    /// Throw the tree away and start over with an empty struct
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Commit offsets from zero, reset `self` and hand over the finished tree.
    /// `self` is reset even when the commit fails.
    pub(crate) fn cook_and_relinquish(&mut self) -> LayoutResult<LayoutElement> {
        let mut root = std::mem::take(self).root;
        let size = root.commit(0)?;
        log::trace!("[RawLayout] Committed layout ({} bytes)", size);
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;
    use crate::layout::LeafType;

    #[test]
    fn test_build_nested() {
        let mut lay = RawLayout::new();
        lay.add(ElementType::Struct, "butts");
        lay.key_mut("butts")
            .add(LeafType::Float3, "pubes")
            .add(LeafType::Float, "dank");
        lay.add(LeafType::Float, "woot");

        assert!(!lay.is_empty());
        assert_eq!(lay.signature(), "St{butts:St{pubes:F3;dank:F1;};woot:F1;}");
        assert!(lay.key("butts").key("dank").is_valid());
    }

    #[test]
    #[should_panic(expected = "No member named 'missing'")]
    fn test_key_mut_missing_is_fatal() {
        RawLayout::new().key_mut("missing");
    }

    #[test]
    fn test_cook_resets_layout() {
        let mut lay = RawLayout::new();
        lay.add(LeafType::Float3, "a").add(LeafType::Float, "b");

        let root = lay.cook_and_relinquish().unwrap();
        assert!(root.is_committed());
        // b would end on the row boundary, so it starts the next row
        assert_eq!(root.key("b").offset_begin(), 16);
        assert_eq!(root.size_in_bytes(), 32);

        assert!(lay.is_empty());
        assert!(!lay.root().is_committed());
        // the same name can be added again to the fresh layout
        lay.add(LeafType::Float, "a");
    }

    #[test]
    fn test_cook_empty_layout_fails() {
        let mut lay = RawLayout::new();
        assert!(matches!(
            lay.cook_and_relinquish(),
            Err(LayoutError::EmptyStruct)
        ));
    }
}
