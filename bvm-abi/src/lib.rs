//! Burrow VM - Calling Convention Adapter
//!
//! This crate defines how values, and in particular fat pointers, cross
//! function boundaries: the register architecture, argument and return
//! marshaling, and the callee's obligation to leave caller-owned registers
//! intact.

pub mod abi;
pub mod regs;

pub use abi::{AbiError, ArgValue, CallSite, CallingConvention, Frame, RetValue};
pub use regs::{Reg, RegisterFile};
