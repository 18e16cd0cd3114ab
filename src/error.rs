//! Layout error handling
//!
//! Schema mistakes are programmer errors. Every fallible operation comes in two
//! flavours: a `try_*` form returning [`LayoutResult`], and a plain form that
//! routes the error through [`fatal`] and panics at the caller.

use std::path::PathBuf;

use thiserror::Error;

use crate::layout::LeafType;

/// Type alias for layout operation results
pub type LayoutResult<T> = Result<T, LayoutError>;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Invalid member name '{name}': must start with a letter or underscore and contain only alphanumerics or underscores")]
    InvalidName { name: String },

    #[error("Duplicate member name '{name}' in struct")]
    DuplicateName { name: String },

    #[error("No member named '{name}' in struct")]
    MissingMember { name: String },

    #[error("Cannot {operation} on {found} element (expected {expected})")]
    WrongKind {
        operation: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Array element count must be nonzero")]
    ZeroLengthArray,

    #[error("Array element type has already been set")]
    ArrayAlreadySet,

    #[error("Array element type has not been set")]
    ArrayUnset,

    #[error("Struct has no members")]
    EmptyStruct,

    #[error("Layout is too large to address")]
    LayoutTooLarge,

    #[error("Layout element is already committed")]
    AlreadyCommitted,

    #[error("Layout element has not been committed")]
    NotCommitted,

    #[error("Leaf type mismatch: element is {actual}, accessed as {requested}")]
    TypeMismatch {
        actual: LeafType,
        requested: LeafType,
    },

    #[error("Array index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Incompatible buffer layouts: {ours} vs {theirs}")]
    IncompatibleLayout { ours: String, theirs: String },

    #[error("Failed to parse {what}: {reason}")]
    Parse { what: &'static str, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Create a wrong-kind error for `operation`
pub(crate) fn wrong_kind(
    operation: &'static str,
    expected: &'static str,
    found: &'static str,
) -> LayoutError {
    LayoutError::WrongKind {
        operation,
        expected,
        found,
    }
}

/// Unwrap a layout result, treating the error as a programming mistake.
///
/// Checks are never compiled out: a malformed schema would corrupt every
/// buffer built from it.
#[track_caller]
pub(crate) fn fatal<T>(result: LayoutResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::error!("[dynamic_cbuffer] Fatal layout error: {}", e);
            panic!("{}", e);
        }
    }
}
