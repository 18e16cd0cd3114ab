//! Packing arithmetic
//!
//! Offsets are packed into 16-byte rows. Aggregates start on a row boundary,
//! and a leaf that would reach the end of its row is moved to the next.
//!
//! The checked forms return `None` when the result does not fit in a `usize`;
//! committing a layout goes through them so oversized schemas are reported
//! instead of wrapping.

use crate::constants::ALIGNMENT;

/// Bytes between `offset` and the next row boundary (zero on a boundary)
pub const fn padding_to_boundary(offset: usize) -> usize {
    (ALIGNMENT - offset % ALIGNMENT) % ALIGNMENT
}

/// Bump `offset` up to the next row boundary (identity if already on one)
pub const fn advance_to_boundary(offset: usize) -> usize {
    offset + padding_to_boundary(offset)
}

pub const fn checked_advance_to_boundary(offset: usize) -> Option<usize> {
    offset.checked_add(padding_to_boundary(offset))
}

/// Whether a leaf of `size` bytes placed at `offset` reaches into another row.
///
/// The end of the leaf counts as part of it, so a leaf ending exactly on a
/// boundary crosses it. Anything larger than a row always crosses.
///
/// This is stricter than HLSL packing. A `float3` followed by a `float` takes
/// 32 bytes here, with the float at offset 16 rather than 12. Three `bool`s
/// followed by `float, float3, float` pack to 64 bytes rather than 32. Shader
/// declarations that are uploaded from these buffers must match the offsets
/// reported by the layout, not the HLSL defaults.
pub const fn crosses_boundary(offset: usize, size: usize) -> bool {
    size > ALIGNMENT || offset % ALIGNMENT + size >= ALIGNMENT
}

/// Move `offset` to the next row if a leaf of `size` bytes would cross one.
/// `None` on overflow.
pub const fn advance_if_crosses_boundary(offset: usize, size: usize) -> Option<usize> {
    if crosses_boundary(offset, size) {
        checked_advance_to_boundary(offset)
    } else {
        Some(offset)
    }
}
