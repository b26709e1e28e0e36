//! Burrow VM - Type Layout Engine
//!
//! This crate computes sizes and offsets, in 16-bit words, for the types a
//! program can place in banked memory: scalars, arrays, and structs. All
//! results follow the machine's width table; aggregates are laid out in
//! declaration order with no padding.

pub mod struct_layout;
pub mod types;

pub use struct_layout::{calculate_struct_layout, find_field, FieldLayout, LayoutError, StructLayout};
pub use types::{FieldDecl, TypeDesc};
