//! Machine module - banked memory and execution state
//!
//! The machine owns the banks, the device-state record behind bank 0, and
//! the execution state. All memory traffic takes a fat pointer; the bank
//! tag picks the segment, the address word picks the word within it.

pub mod mmio;

use crate::constants::MIN_BANK_SIZE;
use bvm_common::{BankId, FatPtr, MachineError, Word};
use bvm_layout::TypeDesc;
use mmio::{Device, MMIO_SPAN};

/// Machine execution state.
///
/// The first fatal fault latches here; after that, every memory or I/O
/// operation returns the latched fault, so a faulting program stops
/// producing output instead of running on with corrupt state.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecState {
    Running,
    Faulted(MachineError),
}

/// The Burrow banked machine.
pub struct Machine {
    /// Memory banks, indexed by bank id. Bank 0 always exists and carries
    /// the MMIO register file in its low words.
    banks: Vec<Vec<Word>>,
    bank_size: Word,
    device: Device,
    state: ExecState,
}

impl Machine {
    pub fn new(bank_size: Word) -> Self {
        Self::with_device(bank_size, Device::new())
    }

    pub fn with_device(bank_size: Word, device: Device) -> Self {
        let bank_size = bank_size.max(MIN_BANK_SIZE);
        Machine {
            banks: vec![vec![0; bank_size as usize]],
            bank_size,
            device,
            state: ExecState::Running,
        }
    }

    /// Allocate a fresh bank and return its id.
    ///
    /// This is where provenance comes from: storage handed out here
    /// determines the bank tag of every pointer derived from it. The null
    /// sentinel id is never reached.
    pub fn alloc_bank(&mut self) -> BankId {
        let id = BankId(self.banks.len() as u16);
        debug_assert!(!id.is_null());
        self.banks.push(vec![0; self.bank_size as usize]);
        log::debug!("allocated bank {id} ({} words)", self.bank_size);
        id
    }

    pub fn bank_size(&self) -> Word {
        self.bank_size
    }

    pub fn state(&self) -> &ExecState {
        &self.state
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self.state, ExecState::Faulted(_))
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut Device {
        &mut self.device
    }

    /// Queue a byte as pending TTY input.
    pub fn push_input(&mut self, byte: u8) {
        self.device.push_input(byte);
    }

    pub fn push_input_str(&mut self, input: &str) {
        self.device.push_input_str(input);
    }

    /// Drain everything written to TTY_OUT so far.
    pub fn take_output(&mut self) -> Vec<u8> {
        self.device.take_output()
    }

    fn check_running(&self) -> Result<(), MachineError> {
        match &self.state {
            ExecState::Running => Ok(()),
            ExecState::Faulted(e) => Err(e.clone()),
        }
    }

    /// Latch a fatal fault and hand it back.
    fn fault(&mut self, e: MachineError) -> MachineError {
        log::debug!("machine fault: {e}");
        self.state = ExecState::Faulted(e.clone());
        e
    }

    /// Validate that `p` denotes live storage.
    fn locate(&self, p: FatPtr) -> Result<(usize, usize), MachineError> {
        let bank = p.bank.0 as usize;
        if p.is_null() || bank >= self.banks.len() || p.address >= self.bank_size {
            return Err(MachineError::bad_access(p));
        }
        Ok((bank, p.address as usize))
    }

    /// Load one word through a fat pointer.
    pub fn load(&mut self, p: FatPtr) -> Result<Word, MachineError> {
        self.check_running()?;
        let (bank, addr) = self.locate(p).map_err(|e| self.fault(e))?;
        if bank == 0 && p.address < MMIO_SPAN {
            return Ok(self.device.read(p.address));
        }
        Ok(self.banks[bank][addr])
    }

    /// Store one word through a fat pointer.
    pub fn store(&mut self, p: FatPtr, value: Word) -> Result<(), MachineError> {
        self.check_running()?;
        let (bank, addr) = self.locate(p).map_err(|e| self.fault(e))?;
        if bank == 0 && p.address < MMIO_SPAN {
            self.device.write(p.address, value);
            return Ok(());
        }
        self.banks[bank][addr] = value;
        Ok(())
    }

    /// Load a char (one word).
    pub fn load_char(&mut self, p: FatPtr) -> Result<Word, MachineError> {
        self.load(p)
    }

    /// Store into a char slot.
    ///
    /// A wider value truncates to its low word silently; narrowing stores
    /// are a documented semantic, not an error.
    pub fn store_char(&mut self, p: FatPtr, value: i32) -> Result<(), MachineError> {
        self.store(p, value as Word)
    }

    /// Load an int (two words, low word first).
    pub fn load_int(&mut self, p: FatPtr) -> Result<i32, MachineError> {
        let lo = u32::from(self.load(p)?);
        let hi = u32::from(self.load(p.add(1, 1))?);
        Ok(((hi << 16) | lo) as i32)
    }

    /// Store an int (two words, low word first).
    pub fn store_int(&mut self, p: FatPtr, value: i32) -> Result<(), MachineError> {
        self.store(p, value as Word)?;
        self.store(p.add(1, 1), (value >> 16) as Word)
    }

    /// Load a pointer from its 4-word footprint `[address, 0, bank, 0]`.
    ///
    /// The reserved high words are ignored; address and bank always travel
    /// together, so a loaded pointer can never be missing its tag.
    pub fn load_ptr(&mut self, p: FatPtr) -> Result<FatPtr, MachineError> {
        let address = self.load(p)?;
        let bank = self.load(p.add(2, 1))?;
        Ok(FatPtr::new(BankId(bank), address))
    }

    /// Store a pointer into its 4-word footprint.
    pub fn store_ptr(&mut self, p: FatPtr, value: FatPtr) -> Result<(), MachineError> {
        self.store(p, value.address)?;
        self.store(p.add(1, 1), 0)?;
        self.store(p.add(2, 1), value.bank.0)?;
        self.store(p.add(3, 1), 0)
    }

    /// Bulk copy of `n` contiguous words, in ascending offset order.
    ///
    /// This is the aggregate-copy primitive: a struct assignment moves its
    /// full computed size through here, bank words of pointer fields
    /// included, never a per-scalar-field walk. Ascending order makes an
    /// exact self-copy harmless and is safe whenever the destination does
    /// not start inside the source's tail; `rt::memmove` handles the other
    /// direction.
    pub fn copy_words(&mut self, dst: FatPtr, src: FatPtr, n: u64) -> Result<(), MachineError> {
        for i in 0..n as i32 {
            let w = self.load(src.add(i, 1))?;
            self.store(dst.add(i, 1), w)?;
        }
        Ok(())
    }

    /// Assignment-copy one value of type `ty`.
    ///
    /// Moves contiguous words equal to the type's full computed size. For
    /// a struct this is what `s2 = s1` means; a pointer field's bank words
    /// are inside the extent, so the copy cannot drop a tag.
    pub fn copy_object(
        &mut self,
        dst: FatPtr,
        src: FatPtr,
        ty: &TypeDesc,
    ) -> Result<(), MachineError> {
        self.copy_words(dst, src, ty.size_in_words())
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("banks", &self.banks.len())
            .field("bank_size", &self.bank_size)
            .field("state", &self.state)
            .finish()
    }
}
