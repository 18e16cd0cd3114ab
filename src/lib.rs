//! Dynamic constant buffers
//!
//! Describe a shader constant buffer at run time, let the crate pack it with
//! 16-byte row rules, then read and write fields by name:
//!
//! ```
//! use dynamic_cbuffer::buffer::Buffer;
//! use dynamic_cbuffer::layout::{ElementType, LayoutRegistry, LeafType, RawLayout};
//! use glam::Vec3;
//!
//! let mut lay = RawLayout::new();
//! lay.add(LeafType::Float3, "color").add(ElementType::Array, "taps");
//! lay.key_mut("taps").set_array(LeafType::Float, 4);
//!
//! let registry = LayoutRegistry::new();
//! let mut buf = Buffer::from_raw(&registry, lay);
//! buf.key_mut("color").set(Vec3::new(1.0, 0.5, 0.0));
//! buf.key_mut("taps").index(2).set(0.25f32);
//!
//! assert_eq!(buf.key("taps").index(2).get::<f32>(), 0.25);
//! assert_eq!(buf.data().len(), buf.size_in_bytes());
//! ```
//!
//! Layouts with identical shape are interned by a [`layout::LayoutRegistry`],
//! so buffers built from equal schemas share one layout tree and can be
//! copied into each other.

pub mod buffer;
pub mod constants;
pub mod error;
pub mod layout;
pub mod schema;

pub use buffer::{Buffer, BufferVisitor, ConstElementView, ElementView, StagedBuffer, UploadTarget};
pub use error::{LayoutError, LayoutResult};
pub use layout::{CookedLayout, ElementType, LayoutElement, LayoutRegistry, LeafData, LeafType, RawLayout};
pub use schema::{ElementDesc, FieldDesc, SchemaDesc};
