//! Calling convention
//!
//! Defines how arguments and return values move through the register file,
//! and the preservation contract a callee owes its caller. A fat pointer
//! crosses every boundary as the ordered word pair `(address, bank)`; an
//! inline-assembly operand carrying a pointer arrives through the same
//! channel, already resolved to that pair.

use crate::regs::{Reg, RegisterFile};
use bvm_common::{BankId, FatPtr, Word};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("argument list needs {0} words (maximum: {1})")]
    TooManyArgumentWords(usize, usize),

    #[error("callee clobbered caller-owned register {0:?}")]
    ClobberedCalleeSaved(Reg),
}

/// An argument value at a call boundary.
///
/// Each variant marshals to its width-table word count: a char is one word,
/// an int is its (lo, hi) pair, and a pointer is `(address, bank)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgValue {
    Char(Word),
    Int(i32),
    Ptr(FatPtr),
}

impl ArgValue {
    fn words(&self) -> Vec<Word> {
        match *self {
            ArgValue::Char(w) => vec![w],
            ArgValue::Int(v) => vec![v as Word, (v >> 16) as Word],
            ArgValue::Ptr(p) => vec![p.address, p.bank.0],
        }
    }
}

/// A return value, delivered through the RV0/RV1 pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetValue {
    Void,
    Char(Word),
    Int(i32),
    Ptr(FatPtr),
}

/// Burrow VM Calling Convention - 32 Register Architecture
///
/// Register usage:
/// - R0: zero register (always 0)
/// - PC, PCB: program counter and bank
/// - RA, RAB: return address and bank
/// - RV0, RV1: return value pair
/// - A0-A3: argument words
/// - X0-X3: reserved for future extensions
/// - T0-T7: temporary/caller-saved registers
/// - S0-S3: saved/callee-saved registers
/// - SC, SB, SP, FP, GP: scratch, stack bank, stack pointer, frame pointer,
///   global pointer (all callee-saved except SC)
pub struct CallingConvention;

impl CallingConvention {
    /// Maximum number of argument words passed in registers.
    pub const MAX_ARG_WORDS: usize = 4;

    /// Registers used for passing argument words, in order.
    pub const ARG_REGS: [Reg; 4] = [Reg::A0, Reg::A1, Reg::A2, Reg::A3];

    /// Registers a callee must leave intact. This set is what keeps a
    /// caller's pointer operands dereferenceable after any call, nested
    /// calls included.
    pub const CALLEE_SAVED: [Reg; 8] = [
        Reg::S0,
        Reg::S1,
        Reg::S2,
        Reg::S3,
        Reg::Sb,
        Reg::Sp,
        Reg::Fp,
        Reg::Gp,
    ];

    /// Registers a callee may clobber freely.
    pub const CALLER_SAVED: [Reg; 8] = [
        Reg::T0,
        Reg::T1,
        Reg::T2,
        Reg::T3,
        Reg::T4,
        Reg::T5,
        Reg::T6,
        Reg::T7,
    ];

    /// Pack argument words into A0..A3 in order.
    ///
    /// A pointer argument lands as two adjacent words, address first, bank
    /// second; the assignment is fixed, never inferred from types at the
    /// other end.
    pub fn marshal_args(regs: &mut RegisterFile, args: &[ArgValue]) -> Result<(), AbiError> {
        let words: Vec<Word> = args.iter().flat_map(|a| a.words()).collect();
        if words.len() > Self::MAX_ARG_WORDS {
            return Err(AbiError::TooManyArgumentWords(
                words.len(),
                Self::MAX_ARG_WORDS,
            ));
        }

        for (i, &w) in words.iter().enumerate() {
            regs.set(Self::ARG_REGS[i], w);
        }
        Ok(())
    }

    /// Read argument word `i` back out (callee side).
    pub fn arg_word(regs: &RegisterFile, i: usize) -> Word {
        regs.get(Self::ARG_REGS[i])
    }

    /// Read a pointer argument whose address word sits at word index `i`.
    pub fn arg_ptr(regs: &RegisterFile, i: usize) -> FatPtr {
        FatPtr::new(
            BankId(regs.get(Self::ARG_REGS[i + 1])),
            regs.get(Self::ARG_REGS[i]),
        )
    }

    /// Read an int argument whose low word sits at word index `i`.
    pub fn arg_int(regs: &RegisterFile, i: usize) -> i32 {
        let lo = regs.get(Self::ARG_REGS[i]) as u32;
        let hi = regs.get(Self::ARG_REGS[i + 1]) as u32;
        ((hi << 16) | lo) as i32
    }

    /// Deliver a return value through RV0/RV1 (callee side).
    pub fn set_return(regs: &mut RegisterFile, ret: RetValue) {
        match ret {
            RetValue::Void => {}
            RetValue::Char(w) => regs.set(Reg::Rv0, w),
            RetValue::Int(v) => {
                regs.set(Reg::Rv0, v as Word);
                regs.set(Reg::Rv1, (v >> 16) as Word);
            }
            RetValue::Ptr(p) => {
                regs.set(Reg::Rv0, p.address);
                regs.set(Reg::Rv1, p.bank.0);
            }
        }
    }

    pub fn return_char(regs: &RegisterFile) -> Word {
        regs.get(Reg::Rv0)
    }

    pub fn return_int(regs: &RegisterFile) -> i32 {
        let lo = regs.get(Reg::Rv0) as u32;
        let hi = regs.get(Reg::Rv1) as u32;
        ((hi << 16) | lo) as i32
    }

    pub fn return_ptr(regs: &RegisterFile) -> FatPtr {
        FatPtr::new(BankId(regs.get(Reg::Rv1)), regs.get(Reg::Rv0))
    }
}

/// Caller-side bracket around a call.
///
/// `enter` marshals the arguments and snapshots every callee-saved
/// register; after the callee body has run, `verify` checks the snapshot
/// and reports the first clobbered register. The correctness property this
/// enforces: any pointer value the caller still holds after the call
/// dereferences to the original storage, because nothing the callee did
/// (transitively through further calls) may have disturbed the caller's
/// saved state.
#[derive(Debug)]
pub struct CallSite {
    saved: [(Reg, Word); 8],
}

impl CallSite {
    pub fn enter(regs: &mut RegisterFile, args: &[ArgValue]) -> Result<CallSite, AbiError> {
        CallingConvention::marshal_args(regs, args)?;
        let mut saved = [(Reg::R0, 0); 8];
        for (slot, &r) in saved.iter_mut().zip(CallingConvention::CALLEE_SAVED.iter()) {
            *slot = (r, regs.get(r));
        }
        Ok(CallSite { saved })
    }

    pub fn verify(self, regs: &RegisterFile) -> Result<(), AbiError> {
        for (r, value) in self.saved {
            if regs.get(r) != value {
                return Err(AbiError::ClobberedCalleeSaved(r));
            }
        }
        Ok(())
    }
}

/// Callee-side save/restore obligation.
///
/// A callee that wants to use callee-saved registers enters a frame naming
/// them; leaving the frame restores the saved words. This is the runtime
/// analogue of a prologue/epilogue: the machine model has no instruction
/// stream, so the save/restore happens as state transitions instead of
/// emitted stores and loads.
#[derive(Debug)]
pub struct Frame {
    saved: Vec<(Reg, Word)>,
}

impl Frame {
    /// Snapshot the callee-saved registers this function will use.
    pub fn enter(regs: &RegisterFile, used: &[Reg]) -> Frame {
        Frame {
            saved: used.iter().map(|&r| (r, regs.get(r))).collect(),
        }
    }

    /// Restore the snapshot, in reverse order of saving.
    pub fn leave(self, regs: &mut RegisterFile) {
        for (r, value) in self.saved.into_iter().rev() {
            regs.set(r, value);
        }
    }
}
