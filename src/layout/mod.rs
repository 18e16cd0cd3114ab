//! Constant buffer layouts
//!
//! Build a [`RawLayout`], intern it through a [`LayoutRegistry`] to get a
//! shared [`CookedLayout`], then create buffers from the cooked layout.

pub mod cooked;
pub mod describe;
pub mod element;
pub mod leaf;
pub mod packing;
pub mod raw;
pub mod registry;

pub use cooked::CookedLayout;
pub use describe::{FieldInfo, LayoutDescription};
pub use element::{is_valid_member_name, ArrayData, ElementKind, ElementType, LayoutElement, Member};
pub use leaf::{LeafData, LeafType, LeafValue, PodLeaf};
pub use raw::RawLayout;
pub use registry::{LayoutRegistry, RegistryConfig};
