//! Burrow VM - Common Types and Utilities
//!
//! This crate contains the value types shared across all components of the
//! Burrow VM runtime model: the machine word, bank identifiers, the
//! bank-tagged fat pointer, the scalar width table, and the fault taxonomy.

pub mod error;
pub mod types;

pub use error::MachineError;
pub use types::*;
