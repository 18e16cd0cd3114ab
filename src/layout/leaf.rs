//! Leaf type catalog
//!
//! The closed set of primitive field kinds a layout can hold, with their GPU
//! byte sizes, signature tags and CPU-side representations.

use std::fmt;

use bytemuck::Pod;
use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::constants::packing::MAX_LEAF_SIZE;

/// Primitive field kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafType {
    Float,
    Float2,
    Float3,
    Float4,
    Matrix,
    Bool,
    Integer,
}

impl LeafType {
    /// Every leaf type, in catalog order
    pub const ALL: [LeafType; 7] = [
        LeafType::Float,
        LeafType::Float2,
        LeafType::Float3,
        LeafType::Float4,
        LeafType::Matrix,
        LeafType::Bool,
        LeafType::Integer,
    ];

    /// Size of the field in the shader-visible buffer
    pub const fn gpu_size(self) -> usize {
        match self {
            LeafType::Float => 4,
            LeafType::Float2 => 8,
            LeafType::Float3 => 12,
            LeafType::Float4 => 16,
            LeafType::Matrix => 64,
            LeafType::Bool => 4,
            LeafType::Integer => 4,
        }
    }

    /// Canonical tag used in layout signatures
    pub const fn tag(self) -> &'static str {
        match self {
            LeafType::Float => "F1",
            LeafType::Float2 => "F2",
            LeafType::Float3 => "F3",
            LeafType::Float4 => "F4",
            LeafType::Matrix => "M4",
            LeafType::Bool => "BL",
            LeafType::Integer => "IN",
        }
    }

    /// Rust type used to read and write this leaf
    pub const fn cpu_type_name(self) -> &'static str {
        match self {
            LeafType::Float => "f32",
            LeafType::Float2 => "glam::Vec2",
            LeafType::Float3 => "glam::Vec3",
            LeafType::Float4 => "glam::Vec4",
            LeafType::Matrix => "glam::Mat4",
            LeafType::Bool => "bool",
            LeafType::Integer => "i32",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|leaf| leaf.tag() == tag)
    }

    /// Lowercase name, also the spelling used in schema files
    pub const fn name(self) -> &'static str {
        match self {
            LeafType::Float => "float",
            LeafType::Float2 => "float2",
            LeafType::Float3 => "float3",
            LeafType::Float4 => "float4",
            LeafType::Matrix => "matrix",
            LeafType::Bool => "bool",
            LeafType::Integer => "integer",
        }
    }
}

const _: () = assert!(LeafType::Matrix.gpu_size() == MAX_LEAF_SIZE);

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// CPU representation of a leaf type.
///
/// This is the reverse map from Rust type to [`LeafType`]. The trait is sealed,
/// so reading or writing a type outside the catalog fails to compile.
pub trait LeafValue: Copy + sealed::Sealed + 'static {
    const LEAF_TYPE: LeafType;

    /// Decode from exactly `LEAF_TYPE.gpu_size()` bytes
    fn read_bytes(bytes: &[u8]) -> Self;

    /// Encode into exactly `LEAF_TYPE.gpu_size()` bytes
    fn write_bytes(&self, bytes: &mut [u8]);
}

/// Leaf representations whose bytes can be borrowed in place
pub trait PodLeaf: LeafValue + Pod {}

/// Validate a leaf representation's size at compile time
macro_rules! validate_leaf_size {
    ($ty:ty, $leaf:ident) => {
        const _: () = assert!(
            std::mem::size_of::<$ty>() == LeafType::$leaf.gpu_size(),
            concat!(
                "CPU type ",
                stringify!($ty),
                " does not match the GPU size of ",
                stringify!($leaf)
            )
        );
    };
}

macro_rules! impl_pod_leaf {
    ($($ty:ty => $leaf:ident),* $(,)?) => {
        $(
            validate_leaf_size!($ty, $leaf);

            impl sealed::Sealed for $ty {}

            impl LeafValue for $ty {
                const LEAF_TYPE: LeafType = LeafType::$leaf;

                fn read_bytes(bytes: &[u8]) -> Self {
                    bytemuck::pod_read_unaligned(bytes)
                }

                fn write_bytes(&self, bytes: &mut [u8]) {
                    bytes.copy_from_slice(bytemuck::bytes_of(self));
                }
            }

            impl PodLeaf for $ty {}
        )*
    };
}

impl_pod_leaf! {
    f32 => Float,
    Vec2 => Float2,
    Vec3 => Float3,
    Vec4 => Float4,
    Mat4 => Matrix,
    i32 => Integer,
}

// Bools occupy a full 4-byte slot on the GPU side
impl sealed::Sealed for bool {}

impl LeafValue for bool {
    const LEAF_TYPE: LeafType = LeafType::Bool;

    fn read_bytes(bytes: &[u8]) -> Self {
        bytemuck::pod_read_unaligned::<u32>(bytes) != 0
    }

    fn write_bytes(&self, bytes: &mut [u8]) {
        bytes.copy_from_slice(bytemuck::bytes_of(&u32::from(*self)));
    }
}

/// A leaf value whose type is only known at run time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeafData {
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Matrix(Mat4),
    Bool(bool),
    Integer(i32),
}

impl LeafData {
    pub fn leaf_type(&self) -> LeafType {
        match self {
            LeafData::Float(_) => LeafType::Float,
            LeafData::Float2(_) => LeafType::Float2,
            LeafData::Float3(_) => LeafType::Float3,
            LeafData::Float4(_) => LeafType::Float4,
            LeafData::Matrix(_) => LeafType::Matrix,
            LeafData::Bool(_) => LeafType::Bool,
            LeafData::Integer(_) => LeafType::Integer,
        }
    }

    /// Decode `bytes` as a value of `leaf`
    pub fn read(leaf: LeafType, bytes: &[u8]) -> Self {
        match leaf {
            LeafType::Float => LeafData::Float(f32::read_bytes(bytes)),
            LeafType::Float2 => LeafData::Float2(Vec2::read_bytes(bytes)),
            LeafType::Float3 => LeafData::Float3(Vec3::read_bytes(bytes)),
            LeafType::Float4 => LeafData::Float4(Vec4::read_bytes(bytes)),
            LeafType::Matrix => LeafData::Matrix(Mat4::read_bytes(bytes)),
            LeafType::Bool => LeafData::Bool(bool::read_bytes(bytes)),
            LeafType::Integer => LeafData::Integer(i32::read_bytes(bytes)),
        }
    }

    pub fn write(&self, bytes: &mut [u8]) {
        match self {
            LeafData::Float(v) => v.write_bytes(bytes),
            LeafData::Float2(v) => v.write_bytes(bytes),
            LeafData::Float3(v) => v.write_bytes(bytes),
            LeafData::Float4(v) => v.write_bytes(bytes),
            LeafData::Matrix(v) => v.write_bytes(bytes),
            LeafData::Bool(v) => v.write_bytes(bytes),
            LeafData::Integer(v) => v.write_bytes(bytes),
        }
    }
}

macro_rules! impl_leaf_data_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for LeafData {
                fn from(value: $ty) -> Self {
                    LeafData::$variant(value)
                }
            }
        )*
    };
}

impl_leaf_data_from! {
    f32 => Float,
    Vec2 => Float2,
    Vec3 => Float3,
    Vec4 => Float4,
    Mat4 => Matrix,
    bool => Bool,
    i32 => Integer,
}
