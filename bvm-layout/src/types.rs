//! Type descriptions for layout computation
//!
//! `TypeDesc` is the shape the layout engine works on: scalar kind, array
//! dimensions, or an ordered field list. Sizes come from the machine's
//! width table; a pointer always occupies the same footprint regardless of
//! its target.

use bvm_common::{CHAR_SIZE_WORDS, INT_SIZE_WORDS, PTR_SIZE_WORDS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Description of a storable type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDesc {
    /// One word, the smallest addressable unit. Packing two characters into
    /// a word takes explicit shift/mask; the layout engine never does it.
    Char,

    /// Two words, stored low word first.
    Int,

    /// Any pointer: four words in memory, `(address, bank)` pair in flight.
    Pointer { target: Box<TypeDesc> },

    /// `N` contiguous elements within one bank.
    Array { element: Box<TypeDesc>, len: u64 },

    /// Fields in declaration order, no padding.
    Struct {
        name: Option<String>,
        fields: Vec<FieldDecl>,
    },
}

/// A struct field as declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeDesc,
}

impl FieldDecl {
    pub fn new(name: &str, ty: TypeDesc) -> Self {
        FieldDecl {
            name: name.to_string(),
            ty,
        }
    }
}

impl TypeDesc {
    /// Pointer to `target`.
    pub fn pointer(target: TypeDesc) -> Self {
        TypeDesc::Pointer {
            target: Box::new(target),
        }
    }

    /// Array of `len` elements of `element`.
    pub fn array(element: TypeDesc, len: u64) -> Self {
        TypeDesc::Array {
            element: Box::new(element),
            len,
        }
    }

    /// Get the size of this type in 16-bit words.
    pub fn size_in_words(&self) -> u64 {
        match self {
            TypeDesc::Char => CHAR_SIZE_WORDS,
            TypeDesc::Int => INT_SIZE_WORDS,
            TypeDesc::Pointer { .. } => PTR_SIZE_WORDS,
            TypeDesc::Array { element, len } => element.size_in_words() * len,
            TypeDesc::Struct { fields, .. } => {
                fields.iter().map(|f| f.ty.size_in_words()).sum()
            }
        }
    }

    /// Array-to-pointer decay.
    ///
    /// `T[M][N]` decays to a pointer to an N-element row, not to a pointer
    /// to T, so the decayed pointer's stride is `N * size(T)`. Non-array
    /// types do not decay.
    pub fn decay(&self) -> Option<TypeDesc> {
        match self {
            TypeDesc::Array { element, .. } => Some(TypeDesc::Pointer {
                target: element.clone(),
            }),
            _ => None,
        }
    }

    /// Element stride of a pointer (or of an array's element), in words.
    ///
    /// This is the `elementSize` that pointer arithmetic scales by; a cast
    /// to a different pointer type changes this and nothing else.
    pub fn stride(&self) -> Option<u64> {
        match self {
            TypeDesc::Pointer { target } => Some(target.size_in_words()),
            TypeDesc::Array { element, .. } => Some(element.size_in_words()),
            _ => None,
        }
    }

    /// Check if this type is a pointer.
    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeDesc::Pointer { .. })
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Char => write!(f, "char"),
            TypeDesc::Int => write!(f, "int"),
            TypeDesc::Pointer { target } => write!(f, "{target}*"),
            TypeDesc::Array { element, len } => write!(f, "{element}[{len}]"),
            TypeDesc::Struct {
                name: Some(name), ..
            } => write!(f, "struct {name}"),
            TypeDesc::Struct { name: None, .. } => write!(f, "struct <anonymous>"),
        }
    }
}
