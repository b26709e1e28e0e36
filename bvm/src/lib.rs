//! Burrow VM - the banked machine
//!
//! A word-addressed, memory-segmented 16-bit machine: every pointer value
//! carries an address word plus a bank tag, and all memory traffic goes
//! through that model. Bank 0 doubles as the MMIO register file for
//! character I/O and the hardware RNG. The `rt` module is the runtime
//! library surface built on top.

pub mod constants;
pub mod machine;
pub mod rt;

pub use machine::mmio::{Device, InputSource};
pub use machine::{ExecState, Machine};
