//! Layout descriptions
//!
//! Flattens a committed tree into an offset table, for logging, tooling and
//! checking a layout against a shader's reflection data.

use serde::Serialize;

use crate::error::{wrong_kind, LayoutResult};
use crate::layout::element::{ElementKind, LayoutElement};

/// Field offset information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    /// Dotted path; array templates appear as `name[]`
    pub path: String,
    pub ty: String,
    /// Rust type to read and write the field with; `None` for aggregates
    pub cpu_type: Option<&'static str>,
    pub offset: usize,
    pub size: usize,
}

/// Complete layout information
#[derive(Debug, Clone, Serialize)]
pub struct LayoutDescription {
    pub signature: String,
    pub total_size: usize,
    pub fields: Vec<FieldInfo>,
}

impl LayoutDescription {
    /// Describe a committed struct element. Array members are listed once, with
    /// the offsets of their first element.
    pub fn of(root: &LayoutElement) -> LayoutResult<Self> {
        if !matches!(root.kind(), ElementKind::Struct(_)) {
            let found = if root.is_valid() { "non-struct" } else { "empty" };
            return Err(wrong_kind("describe", "struct", found));
        }

        let mut fields = Vec::new();
        for member in root.members() {
            collect(member.name().to_string(), member.element(), &mut fields)?;
        }

        Ok(Self {
            signature: root.try_signature()?,
            total_size: root.try_size_in_bytes()?,
            fields,
        })
    }

    pub fn field(&self, path: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.path == path)
    }

    /// Generate a debug string showing the layout
    pub fn debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Total size: {} bytes\n", self.total_size));
        s.push_str(&format!("Signature: {}\n", self.signature));
        s.push_str("Fields:\n");

        for field in &self.fields {
            s.push_str(&format!(
                "  {:30} @ {:5} ({:5} bytes) : {}",
                field.path, field.offset, field.size, field.ty
            ));
            if let Some(cpu_type) = field.cpu_type {
                s.push_str(&format!(" as {}", cpu_type));
            }
            s.push('\n');
        }

        s
    }
}

fn collect(path: String, element: &LayoutElement, out: &mut Vec<FieldInfo>) -> LayoutResult<()> {
    let offset = element.try_offset_begin()?;
    let size = element.try_size_in_bytes()?;

    match element.kind() {
        ElementKind::Leaf(leaf) => out.push(FieldInfo {
            path,
            ty: leaf.to_string(),
            cpu_type: Some(leaf.cpu_type_name()),
            offset,
            size,
        }),
        ElementKind::Struct(members) => {
            out.push(FieldInfo {
                path: path.clone(),
                ty: "struct".to_string(),
                cpu_type: None,
                offset,
                size,
            });
            for member in members {
                collect(format!("{}.{}", path, member.name()), member.element(), out)?;
            }
        }
        ElementKind::Array(data) => {
            out.push(FieldInfo {
                path: path.clone(),
                ty: format!("array[{}] (stride {})", data.count(), data.stride()),
                cpu_type: None,
                offset,
                size,
            });
            let template = element.try_template()?;
            collect(format!("{}[]", path), template, out)?;
        }
        ElementKind::Empty => {}
    }

    Ok(())
}
