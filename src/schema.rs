//! Schema descriptions
//!
//! Lets layouts be written down in TOML instead of built in code. Only the
//! shape is described; offsets are always computed when the layout is cooked.
//!
//! ```toml
//! [[field]]
//! name = "nTaps"
//! type = "integer"
//!
//! [[field]]
//! name = "lights"
//! type = "array"
//! count = 4
//! element = { type = "struct", fields = [
//!     { name = "pos", type = "float3" },
//!     { name = "range", type = "float" },
//! ] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{wrong_kind, LayoutError, LayoutResult};
use crate::layout::{ElementKind, ElementType, LayoutElement, LeafType, RawLayout};

/// Top-level schema: the members of the root struct
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaDesc {
    #[serde(rename = "field", default)]
    pub fields: Vec<FieldDesc>,
}

/// A named struct member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDesc {
    pub name: String,
    #[serde(flatten)]
    pub element: ElementDesc,
}

/// Shape of one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementDesc {
    Float,
    Float2,
    Float3,
    Float4,
    Matrix,
    Bool,
    Integer,
    Struct {
        #[serde(default)]
        fields: Vec<FieldDesc>,
    },
    Array {
        count: usize,
        element: Box<ElementDesc>,
    },
}

impl ElementDesc {
    fn element_type(&self) -> ElementType {
        match self {
            ElementDesc::Float => LeafType::Float.into(),
            ElementDesc::Float2 => LeafType::Float2.into(),
            ElementDesc::Float3 => LeafType::Float3.into(),
            ElementDesc::Float4 => LeafType::Float4.into(),
            ElementDesc::Matrix => LeafType::Matrix.into(),
            ElementDesc::Bool => LeafType::Bool.into(),
            ElementDesc::Integer => LeafType::Integer.into(),
            ElementDesc::Struct { .. } => ElementType::Struct,
            ElementDesc::Array { .. } => ElementType::Array,
        }
    }

    fn from_leaf(leaf: LeafType) -> Self {
        match leaf {
            LeafType::Float => ElementDesc::Float,
            LeafType::Float2 => ElementDesc::Float2,
            LeafType::Float3 => ElementDesc::Float3,
            LeafType::Float4 => ElementDesc::Float4,
            LeafType::Matrix => ElementDesc::Matrix,
            LeafType::Bool => ElementDesc::Bool,
            LeafType::Integer => ElementDesc::Integer,
        }
    }

    /// Fill in a freshly created element of the matching type
    fn configure(&self, element: &mut LayoutElement) -> LayoutResult<()> {
        match self {
            ElementDesc::Struct { fields } => {
                for field in fields {
                    element.try_add(field.element.element_type(), field.name.as_str())?;
                    field.element.configure(element.try_key_mut(&field.name)?)?;
                }
                Ok(())
            }
            ElementDesc::Array { count, element: inner } => {
                element.try_set_array(inner.element_type(), *count)?;
                inner.configure(element.try_template_mut()?)
            }
            _ => Ok(()),
        }
    }

    /// Describe an existing element
    pub fn from_element(element: &LayoutElement) -> LayoutResult<Self> {
        match element.kind() {
            ElementKind::Leaf(leaf) => Ok(Self::from_leaf(*leaf)),
            ElementKind::Struct(members) => Ok(ElementDesc::Struct {
                fields: members
                    .iter()
                    .map(|member| FieldDesc::from_member(member.name(), member.element()))
                    .collect::<LayoutResult<_>>()?,
            }),
            ElementKind::Array(data) => Ok(ElementDesc::Array {
                count: data.count(),
                element: Box::new(Self::from_element(element.try_template()?)?),
            }),
            ElementKind::Empty => Err(wrong_kind("describe", "leaf, struct or array", "empty")),
        }
    }
}

impl FieldDesc {
    fn from_member(name: &str, element: &LayoutElement) -> LayoutResult<Self> {
        Ok(Self {
            name: name.to_string(),
            element: ElementDesc::from_element(element)?,
        })
    }
}

impl SchemaDesc {
    pub fn from_toml_str(raw: &str) -> LayoutResult<Self> {
        toml::from_str(raw).map_err(|e| LayoutError::Parse {
            what: "schema",
            reason: e.to_string(),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> LayoutResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("[SchemaDesc] Loaded schema from {}", path.display());
        Self::from_toml_str(&raw)
    }

    /// Build a raw layout from this description. Name and array mistakes are
    /// reported here; an empty struct is only caught when the layout is cooked.
    pub fn to_raw_layout(&self) -> LayoutResult<RawLayout> {
        let mut raw = RawLayout::new();
        for field in &self.fields {
            raw.try_add(field.element.element_type(), field.name.as_str())?;
            field.element.configure(raw.try_key_mut(&field.name)?)?;
        }
        Ok(raw)
    }

    /// Describe the shape of a struct element, committed or not
    pub fn from_element(root: &LayoutElement) -> LayoutResult<Self> {
        match ElementDesc::from_element(root)? {
            ElementDesc::Struct { fields } => Ok(Self { fields }),
            _ => Err(wrong_kind("describe", "struct", root.kind().name())),
        }
    }
}
