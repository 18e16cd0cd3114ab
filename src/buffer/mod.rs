//! Constant buffers
//!
//! Byte storage shaped by a cooked layout, plus the views used to read and
//! write it.

pub mod constant_buffer;
pub mod staged;
pub mod view;
pub mod visit;

pub use constant_buffer::Buffer;
pub use staged::{StagedBuffer, UploadTarget};
pub use view::{ConstElementView, ElementView};
pub use visit::BufferVisitor;
