//! Fault taxonomy for the Burrow VM
//!
//! The machine detects exactly one class of runtime fault: dereferencing a
//! pointer whose bank/address pair does not denote live storage. Everything
//! else the memory model leaves undefined (cross-bank arithmetic) or silent
//! (narrowing stores) by design, so those have no variants here.

use crate::types::{BankId, FatPtr, Word};
use thiserror::Error;

/// Fatal machine faults.
///
/// A fault is local and synchronous: there is no recovery layer. The
/// machine latches the first fault and every subsequent memory or I/O
/// operation returns it, so a faulted program produces no further output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    #[error("null or out-of-range access: address {address:#06x} in bank {bank}")]
    NullOrOutOfRangeAccess { bank: BankId, address: Word },
}

impl MachineError {
    /// Build the fault for a bad dereference of `ptr`.
    pub fn bad_access(ptr: FatPtr) -> Self {
        MachineError::NullOrOutOfRangeAccess {
            bank: ptr.bank,
            address: ptr.address,
        }
    }
}
