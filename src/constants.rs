// Dynamic constant buffer constants - SINGLE SOURCE OF TRUTH
//
// Packing numbers shared by the layout tree, the buffers and the tests.
// Leaf sizes live in the leaf catalog (`layout::leaf`), not here.

/// Packing convention constants
pub mod packing {
    /// Size of one shader register row; aggregates start on this boundary
    pub const ALIGNMENT: usize = 16;

    /// Largest leaf in the catalog (a 4x4 float matrix)
    pub const MAX_LEAF_SIZE: usize = 64;
}

/// Registry defaults
pub mod registry {
    /// Initial capacity of the signature map
    pub const DEFAULT_INITIAL_CAPACITY: usize = 64;

    /// Interned layout count above which the registry logs a warning
    pub const DEFAULT_WARN_THRESHOLD: usize = 1024;
}

pub use packing::ALIGNMENT;
