//! Core value types for the Burrow VM
//!
//! This module defines the machine word, memory bank identifiers, the
//! bank-tagged fat pointer, and the scalar width table shared by the layout
//! engine, the calling convention adapter, and the machine itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine word: 16 bits, the smallest addressable unit.
pub type Word = u16;

/// Size of a `char` in words.
pub const CHAR_SIZE_WORDS: u64 = 1;

/// Size of an `int` in words (stored low word first).
pub const INT_SIZE_WORDS: u64 = 2;

/// In-memory footprint of any pointer: address pair plus bank pair.
///
/// The layout is `[address, 0, bank, 0]` - address and bank each occupy a
/// register-pair-sized slot whose high word is written as zero on store and
/// ignored on load. At a call boundary a pointer is the two-word ordered
/// pair `(address, bank)`.
pub const PTR_SIZE_WORDS: u64 = 4;

/// Memory bank identifier.
///
/// A pointer is meaningless without the bank it indexes into. Bank 0 is the
/// absolute/MMIO bank; the top id is reserved as the null sentinel and is
/// never handed out by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BankId(pub u16);

impl BankId {
    /// Bank 0: absolute addresses and the MMIO register file.
    pub const MMIO: BankId = BankId(0);

    /// Reserved sentinel bank for the canonical null pointer.
    ///
    /// Never allocated, so `address 0, bank 0` stays a legitimate MMIO
    /// reference while null remains representationally distinct.
    pub const NULL: BankId = BankId(0xFFFF);

    /// Check whether this is the null sentinel.
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "b{}", self.0)
        }
    }
}

/// A fat pointer: address word plus bank tag.
///
/// The bank is determined by the provenance of the storage the pointer was
/// derived from (a stack frame, a global, a heap-like region, or bank 0 for
/// MMIO). Both fields are always set together; no code path produces an
/// address without a bank.
///
/// A cast between pointer types changes neither field - only the element
/// size used by subsequent arithmetic - so there is no cast operation here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FatPtr {
    pub address: Word,
    pub bank: BankId,
}

impl FatPtr {
    /// The canonical null pointer.
    pub const NULL: FatPtr = FatPtr {
        address: 0,
        bank: BankId::NULL,
    };

    /// Create a pointer into `bank` at word offset `address`.
    pub fn new(bank: BankId, address: Word) -> Self {
        FatPtr { address, bank }
    }

    /// The canonical null pointer (`address 0` in the reserved sentinel bank).
    pub fn null() -> Self {
        Self::NULL
    }

    /// Cast an arbitrary integer to a pointer.
    ///
    /// The bank defaults to the absolute/MMIO bank 0; the integer's low word
    /// becomes the address. This is exactly how device registers are
    /// reached from the language surface.
    pub fn from_int(value: i32) -> Self {
        FatPtr {
            address: value as Word,
            bank: BankId::MMIO,
        }
    }

    /// Cast back to an integer, keeping the address word only.
    ///
    /// The bank tag is dropped; round-tripping through an integer is the
    /// explicit narrowing cast the pointer model warns about.
    pub fn to_int(self) -> i32 {
        i32::from(self.address)
    }

    /// Check whether this is the canonical null pointer.
    pub fn is_null(self) -> bool {
        self.bank.is_null()
    }

    /// Pointer arithmetic: move by `n` elements of `elem_size_words` each.
    ///
    /// The bank never changes. Keeping the result inside the bank's extent
    /// is the caller's responsibility; out-of-bank arithmetic wraps rather
    /// than trapping, and only a later dereference can fault.
    pub fn add(self, n: i32, elem_size_words: u64) -> Self {
        let step = n.wrapping_mul(elem_size_words as i32) as Word;
        FatPtr {
            address: self.address.wrapping_add(step),
            bank: self.bank,
        }
    }

    /// Pointer difference in elements of `elem_size_words` each.
    ///
    /// Defined only when both pointers carry the same bank. Differencing
    /// across banks is undefined: the address arithmetic still happens
    /// (wrapping), a warning is logged, and no trap occurs.
    pub fn diff(self, other: FatPtr, elem_size_words: u64) -> i32 {
        if self.bank != other.bank {
            log::warn!(
                "pointer difference across banks: {} vs {} (undefined)",
                self,
                other
            );
        }
        let words = self.address.wrapping_sub(other.address) as i16;
        i32::from(words) / elem_size_words as i32
    }
}

impl fmt::Display for FatPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}@{}", self.address, self.bank)
    }
}
