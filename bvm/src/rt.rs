//! Runtime library surface
//!
//! The handful of routines a program links against: character I/O over the
//! TTY device and the memory/string walkers. Everything here goes through
//! the fat-pointer model - `putchar` and `getchar` reach the device purely
//! by dereferencing bank-0 pointers, and the copy routines move whole word
//! extents so pointer fields keep their bank tags.
//!
//! Lengths count words; `char` is one word, so "bytes" and "words" coincide
//! for character buffers on this machine.

use crate::machine::mmio::{TTY_HAS_BYTE, TTY_IN_POP, TTY_IN_STATUS, TTY_OUT};
use crate::machine::Machine;
use bvm_common::{BankId, FatPtr, MachineError};

/// Write one character to the TTY. Returns the byte written.
pub fn putchar(m: &mut Machine, c: i32) -> Result<i32, MachineError> {
    m.store_char(FatPtr::new(BankId::MMIO, TTY_OUT), c)?;
    Ok(c & 0xFF)
}

/// Write a NUL-terminated string followed by a newline.
pub fn puts(m: &mut Machine, s: FatPtr) -> Result<i32, MachineError> {
    let mut i = 0;
    loop {
        let ch = m.load_char(s.add(i, 1))?;
        if ch == 0 {
            break;
        }
        putchar(m, i32::from(ch))?;
        i += 1;
    }
    putchar(m, i32::from(b'\n'))?;
    Ok(0)
}

/// Read one byte from the TTY.
///
/// Busy-waits on the input status register until a byte is pending, then
/// pops exactly once. This is the only blocking operation on the machine:
/// the poll loop suspends the entire single thread of execution, with no
/// timeout and no cancellation, until input arrives.
pub fn getchar(m: &mut Machine) -> Result<i32, MachineError> {
    let status = FatPtr::new(BankId::MMIO, TTY_IN_STATUS);
    loop {
        if m.load(status)? & TTY_HAS_BYTE != 0 {
            break;
        }
    }
    let byte = m.load(FatPtr::new(BankId::MMIO, TTY_IN_POP))?;
    Ok(i32::from(byte))
}

/// Copy `n` words from `src` to `dst` (non-overlapping). Returns `dst`.
pub fn memcpy(m: &mut Machine, dst: FatPtr, src: FatPtr, n: i32) -> Result<FatPtr, MachineError> {
    m.copy_words(dst, src, n.max(0) as u64)?;
    Ok(dst)
}

/// Copy `n` words, correct for overlapping regions. Returns `dst`.
///
/// Forward copy unless the destination starts above the source inside the
/// same bank and the ranges overlap; then the copy runs backward so the
/// tail is moved before it is overwritten.
pub fn memmove(m: &mut Machine, dst: FatPtr, src: FatPtr, n: i32) -> Result<FatPtr, MachineError> {
    let n = n.max(0);
    let overlap_backward = dst.bank == src.bank
        && dst.address > src.address
        && u32::from(src.address) + n as u32 > u32::from(dst.address);

    if overlap_backward {
        for i in (0..n).rev() {
            let w = m.load(src.add(i, 1))?;
            m.store(dst.add(i, 1), w)?;
        }
    } else {
        m.copy_words(dst, src, n as u64)?;
    }
    Ok(dst)
}

/// Fill `n` words with the low word of `c`. Returns `dst`.
pub fn memset(m: &mut Machine, dst: FatPtr, c: i32, n: i32) -> Result<FatPtr, MachineError> {
    for i in 0..n.max(0) {
        m.store_char(dst.add(i, 1), c)?;
    }
    Ok(dst)
}

/// Compare `n` words; the sign of the first mismatch, 0 when equal.
pub fn memcmp(m: &mut Machine, a: FatPtr, b: FatPtr, n: i32) -> Result<i32, MachineError> {
    for i in 0..n.max(0) {
        let wa = i32::from(m.load(a.add(i, 1))?);
        let wb = i32::from(m.load(b.add(i, 1))?);
        if wa != wb {
            return Ok(wa - wb);
        }
    }
    Ok(0)
}

/// Length of a NUL-terminated string, in chars.
pub fn strlen(m: &mut Machine, s: FatPtr) -> Result<i32, MachineError> {
    let mut len = 0;
    while m.load_char(s.add(len, 1))? != 0 {
        len += 1;
    }
    Ok(len)
}

/// Copy a NUL-terminated string including the terminator. Returns `dst`.
pub fn strcpy(m: &mut Machine, dst: FatPtr, src: FatPtr) -> Result<FatPtr, MachineError> {
    let mut i = 0;
    loop {
        let ch = m.load_char(src.add(i, 1))?;
        m.store_char(dst.add(i, 1), i32::from(ch))?;
        if ch == 0 {
            break;
        }
        i += 1;
    }
    Ok(dst)
}
