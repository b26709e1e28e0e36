//! Central configuration and constants for the Burrow VM

use bvm_common::Word;

/// Default words per memory bank.
pub const DEFAULT_BANK_SIZE: Word = 4096;

/// Minimum reasonable bank size (must at least cover the MMIO span).
pub const MIN_BANK_SIZE: Word = 64;
