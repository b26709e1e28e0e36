//! Struct layout calculation
//!
//! Computes field offsets and total sizes for structs: sequential layout in
//! declaration order, no alignment padding. An embedded struct contributes
//! its full size at the embedding point, and its own fields resolve through
//! `StructLayout::offset_of` with a dotted path.

use crate::types::{FieldDecl, TypeDesc};
use thiserror::Error;

/// Word extent a single bank can address (16-bit word offsets).
const BANK_EXTENT_WORDS: u64 = 1 << 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("struct '{name}' needs {size} words, more than one bank can hold")]
    TooLargeForBank { name: String, size: u64 },
}

/// Information about a struct's memory layout.
#[derive(Debug, Clone, PartialEq)]
pub struct StructLayout {
    pub fields: Vec<FieldLayout>,
    /// Total size in words; also the word count a struct copy must move.
    pub total_size: u64,
}

/// Layout information for a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayout {
    pub name: String,
    pub ty: TypeDesc,
    /// Offset in words from the start of the struct.
    pub offset: u64,
    /// Size in words.
    pub size: u64,
}

/// Calculate the memory layout for a struct.
///
/// Offsets are the cumulative word sizes of the preceding fields. A
/// pointer-typed field occupies the same 4-word footprint as a standalone
/// pointer; its bank words are part of the struct's extent, which is why
/// copies must move `total_size` words and never walk fields scalar by
/// scalar.
///
/// # Errors
/// Returns an error when the struct cannot fit in a single bank, since an
/// aggregate is contiguous within one bank by definition.
pub fn calculate_struct_layout(
    name: Option<&str>,
    fields: &[FieldDecl],
) -> Result<StructLayout, LayoutError> {
    let mut layout_fields = Vec::new();
    let mut current_offset = 0u64;

    for field in fields {
        let field_size = field.ty.size_in_words();

        layout_fields.push(FieldLayout {
            name: field.name.clone(),
            ty: field.ty.clone(),
            offset: current_offset,
            size: field_size,
        });

        current_offset += field_size;
        if current_offset > BANK_EXTENT_WORDS {
            return Err(LayoutError::TooLargeForBank {
                name: name.unwrap_or("<anonymous>").to_string(),
                size: current_offset,
            });
        }
    }

    Ok(StructLayout {
        fields: layout_fields,
        total_size: current_offset,
    })
}

/// Find a field in a struct layout by name.
pub fn find_field<'a>(layout: &'a StructLayout, field_name: &str) -> Option<&'a FieldLayout> {
    layout.fields.iter().find(|f| f.name == field_name)
}

impl StructLayout {
    /// Compute the layout of a `TypeDesc::Struct`; `None` for other types.
    pub fn of(ty: &TypeDesc) -> Option<Result<StructLayout, LayoutError>> {
        match ty {
            TypeDesc::Struct { name, fields } => {
                Some(calculate_struct_layout(name.as_deref(), fields))
            }
            _ => None,
        }
    }

    /// Resolve a dotted field path (`"inner.p"`) to a word offset.
    ///
    /// Embedded structs flatten into the parent's offset sequence at the
    /// embedding point, so the result is the offset from the start of the
    /// outermost struct.
    pub fn offset_of(&self, path: &str) -> Option<u64> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let field = find_field(self, first)?;

        let mut offset = field.offset;
        let mut ty = &field.ty;

        for part in parts {
            let TypeDesc::Struct { fields, .. } = ty else {
                return None;
            };
            let mut inner_offset = 0u64;
            let mut found = None;
            for f in fields {
                if f.name == part {
                    found = Some(f);
                    break;
                }
                inner_offset += f.ty.size_in_words();
            }
            let f = found?;
            offset += inner_offset;
            ty = &f.ty;
        }

        Some(offset)
    }

    /// Type of the field at a dotted path.
    pub fn type_of(&self, path: &str) -> Option<&TypeDesc> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut ty = &find_field(self, first)?.ty;

        for part in parts {
            let TypeDesc::Struct { fields, .. } = ty else {
                return None;
            };
            ty = &fields.iter().find(|f| f.name == part)?.ty;
        }

        Some(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::new("x", TypeDesc::Int),
            FieldDecl::new("y", TypeDesc::Int),
        ]
    }

    #[test]
    fn test_simple_struct_layout() {
        let fields = vec![
            FieldDecl::new("c", TypeDesc::Char),
            FieldDecl::new("n", TypeDesc::Int),
            FieldDecl::new("p", TypeDesc::pointer(TypeDesc::Int)),
        ];

        let layout = calculate_struct_layout(Some("mixed"), &fields).expect("layout");

        assert_eq!(layout.total_size, 7); // 1 + 2 + 4 words
        assert_eq!(layout.fields[0].offset, 0);
        assert_eq!(layout.fields[1].offset, 1);
        assert_eq!(layout.fields[2].offset, 3);
        assert_eq!(layout.fields[2].size, 4);
    }

    #[test]
    fn test_no_padding_between_fields() {
        // char then int: the int starts at word 1, not at an even offset
        let fields = vec![
            FieldDecl::new("c", TypeDesc::Char),
            FieldDecl::new("n", TypeDesc::Int),
        ];
        let layout = calculate_struct_layout(None, &fields).expect("layout");

        assert_eq!(layout.fields[1].offset, 1);
        assert_eq!(layout.total_size, 3);
    }

    #[test]
    fn test_struct_with_array_field() {
        let fields = vec![
            FieldDecl::new("arr", TypeDesc::array(TypeDesc::Int, 10)),
            FieldDecl::new("x", TypeDesc::Int),
        ];

        let layout = calculate_struct_layout(None, &fields).expect("layout");

        assert_eq!(layout.total_size, 22); // 20 + 2 words
        assert_eq!(layout.fields[1].offset, 20);
    }

    #[test]
    fn test_nested_struct_flattens() {
        let inner = TypeDesc::Struct {
            name: Some("Inner".to_string()),
            fields: vec![
                FieldDecl::new("a", TypeDesc::Int),
                FieldDecl::new("p", TypeDesc::pointer(TypeDesc::Char)),
            ],
        };
        let fields = vec![
            FieldDecl::new("tag", TypeDesc::Char),
            FieldDecl::new("inner", inner),
            FieldDecl::new("x", TypeDesc::Int),
        ];

        let layout = calculate_struct_layout(Some("Outer"), &fields).expect("layout");

        assert_eq!(layout.total_size, 9); // 1 + (2 + 4) + 2
        assert_eq!(layout.offset_of("tag"), Some(0));
        assert_eq!(layout.offset_of("inner"), Some(1));
        assert_eq!(layout.offset_of("inner.a"), Some(1));
        assert_eq!(layout.offset_of("inner.p"), Some(3));
        assert_eq!(layout.offset_of("x"), Some(7));
        assert_eq!(layout.offset_of("inner.missing"), None);
    }

    #[test]
    fn test_type_of_path() {
        let inner = TypeDesc::Struct {
            name: None,
            fields: vec![FieldDecl::new("p", TypeDesc::pointer(TypeDesc::Int))],
        };
        let fields = vec![FieldDecl::new("inner", inner)];
        let layout = calculate_struct_layout(None, &fields).expect("layout");

        assert!(layout.type_of("inner.p").unwrap().is_pointer());
        assert!(layout.type_of("inner.q").is_none());
    }

    #[test]
    fn test_empty_struct() {
        let layout = calculate_struct_layout(None, &[]).expect("layout");
        assert_eq!(layout.total_size, 0);
        assert!(layout.fields.is_empty());
    }

    #[test]
    fn test_too_large_for_bank() {
        let fields = vec![FieldDecl::new(
            "huge",
            TypeDesc::array(TypeDesc::Int, 40_000),
        )];
        let result = calculate_struct_layout(Some("huge"), &fields);

        assert_eq!(
            result,
            Err(LayoutError::TooLargeForBank {
                name: "huge".to_string(),
                size: 80_000,
            })
        );
    }

    #[test]
    fn test_find_field() {
        let layout = calculate_struct_layout(Some("Point"), &point_fields()).expect("layout");

        let y = find_field(&layout, "y").expect("field y");
        assert_eq!(y.offset, 2);
        assert!(find_field(&layout, "z").is_none());
    }

    #[test]
    fn test_layout_survives_json_round_trip() {
        let ty = TypeDesc::Struct {
            name: Some("Point".to_string()),
            fields: point_fields(),
        };

        let json = serde_json::to_string(&ty).expect("serialize");
        let back: TypeDesc = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(back, ty);
        assert_eq!(back.size_in_words(), 4);
    }
}
