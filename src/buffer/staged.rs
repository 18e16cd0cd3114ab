//! CPU-side staging for GPU uploads
//!
//! A [`StagedBuffer`] pairs a buffer with a dirty flag, so per-frame code can
//! edit freely and only pay for an upload when something changed.

use super::constant_buffer::Buffer;
use super::visit::BufferVisitor;

/// Destination for buffer bytes, usually a GPU constant buffer
pub trait UploadTarget {
    type Error;

    /// Replace the target's contents with `bytes`
    fn upload(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// A plain byte vector works as a target, which is handy for tests and
/// software renderers.
impl UploadTarget for Vec<u8> {
    type Error = std::convert::Infallible;

    fn upload(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.clear();
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// A buffer that remembers whether it needs uploading
#[derive(Debug, Clone)]
pub struct StagedBuffer {
    buffer: Buffer,
    dirty: bool,
}

impl StagedBuffer {
    /// Starts dirty, so the first flush always uploads
    pub fn new(buffer: Buffer) -> Self {
        Self { buffer, dirty: true }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Mutable access to the contents; marks the buffer dirty
    pub fn edit(&mut self) -> &mut Buffer {
        self.dirty = true;
        &mut self.buffer
    }

    /// Copy in the contents of a buffer with the same layout
    #[track_caller]
    pub fn set_buffer(&mut self, other: &Buffer) {
        self.buffer.copy_from(other);
        self.dirty = true;
    }

    /// Walk the leaves with `visitor`; marks the buffer dirty if the visitor
    /// changed anything
    pub fn accept<V: BufferVisitor + ?Sized>(&mut self, visitor: &mut V) -> bool {
        let changed = self.buffer.accept(visitor);
        self.dirty |= changed;
        changed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Upload if dirty. Returns whether an upload happened; the buffer stays
    /// dirty if the upload fails.
    pub fn flush<T: UploadTarget>(&mut self, target: &mut T) -> Result<bool, T::Error> {
        if !self.dirty {
            return Ok(false);
        }
        target.upload(self.buffer.data())?;
        log::trace!("[StagedBuffer] Uploaded {} bytes", self.buffer.size_in_bytes());
        self.dirty = false;
        Ok(true)
    }

    pub fn into_inner(self) -> Buffer {
        self.buffer
    }
}

impl From<Buffer> for StagedBuffer {
    fn from(buffer: Buffer) -> Self {
        Self::new(buffer)
    }
}
