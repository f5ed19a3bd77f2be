//! Mock implementations for testing
//!
//! [`MockSpiIface`] records every transaction instead of driving a bus, and
//! answers reads from a per-device register file so drivers can be tested
//! against a loopback.

#![cfg(any(test, feature = "mock"))]

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::peripheral::{ChipSelect, SpiConfig, SpiIface, TransportError};

/// Read flag of a 16-bit register frame.
const READ_FLAG: u32 = 0x8000;
/// Address bits of a 16-bit register frame.
const ADDR_MASK: u32 = 0x3F;

/// One recorded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiTransaction {
    /// Chip select the frame was sent to.
    pub chip_select: ChipSelect,
    /// Per-transaction configuration.
    pub config: SpiConfig,
    /// Frame contents, right-aligned.
    pub bits: u32,
    /// Frame width.
    pub num_bits: u8,
    /// Whether the caller asked for readback.
    pub readback: bool,
}

impl SpiTransaction {
    /// Register address of a 16-bit register frame.
    #[allow(clippy::cast_possible_truncation)]
    pub fn register(&self) -> Option<u8> {
        (self.num_bits == 16).then(|| ((self.bits >> 8) & ADDR_MASK) as u8)
    }

    /// `true` for a 16-bit register write to `addr`.
    pub fn is_write_to(&self, addr: u8) -> bool {
        !self.readback && self.bits & READ_FLAG == 0 && self.register() == Some(addr)
    }

    /// `true` for a 16-bit register read of `addr`.
    pub fn is_read_of(&self, addr: u8) -> bool {
        self.readback && self.bits & READ_FLAG != 0 && self.register() == Some(addr)
    }
}

#[derive(Default)]
struct MockState {
    transactions: Vec<SpiTransaction>,
    registers: BTreeMap<(ChipSelect, u8), u8>,
    /// Transactions still allowed through, and the error that follows them.
    fail_after: Option<(usize, TransportError)>,
}

/// Recording, loopback SPI transport.
///
/// 16-bit frames are interpreted as `R/W̄ | x | addr[5:0] | data[7:0]`:
/// writes store `data` under `(chip_select, addr)`, reads return the stored
/// byte in the low 8 bits. Other widths are recorded and read back as 0.
#[derive(Default)]
pub struct MockSpiIface {
    state: Mutex<MockState>,
}

impl MockSpiIface {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All transactions so far, oldest first.
    pub fn transactions(&self) -> Vec<SpiTransaction> {
        self.state().transactions.clone()
    }

    /// Number of register writes to `addr` on `chip_select`.
    pub fn writes_to(&self, chip_select: ChipSelect, addr: u8) -> usize {
        self.state()
            .transactions
            .iter()
            .filter(|t| t.chip_select == chip_select && t.is_write_to(addr))
            .count()
    }

    /// Number of register reads of `addr` on `chip_select`.
    pub fn reads_of(&self, chip_select: ChipSelect, addr: u8) -> usize {
        self.state()
            .transactions
            .iter()
            .filter(|t| t.chip_select == chip_select && t.is_read_of(addr))
            .count()
    }

    /// Current content of a register in the loopback file.
    pub fn register(&self, chip_select: ChipSelect, addr: u8) -> u8 {
        self.state()
            .registers
            .get(&(chip_select, addr))
            .copied()
            .unwrap_or(0)
    }

    /// Program the value a subsequent read of `addr` returns.
    pub fn set_register(&self, chip_select: ChipSelect, addr: u8, value: u8) {
        self.state().registers.insert((chip_select, addr), value);
    }

    /// Make the next transaction fail with `err`. It is not recorded.
    pub fn fail_next(&self, err: TransportError) {
        self.fail_after(0, err);
    }

    /// Let `passed` transactions through, then fail the one after with
    /// `err`. The failed transaction is not recorded.
    pub fn fail_after(&self, passed: usize, err: TransportError) {
        self.state().fail_after = Some((passed, err));
    }

    /// Forget recorded transactions, keeping the register file.
    pub fn clear_transactions(&self) {
        self.state().transactions.clear();
    }
}

impl SpiIface for MockSpiIface {
    #[allow(clippy::cast_possible_truncation)]
    fn transact_spi(
        &self,
        chip_select: ChipSelect,
        config: SpiConfig,
        bits: u32,
        num_bits: u8,
        readback: bool,
    ) -> Result<u32, TransportError> {
        let mut state = self.state();
        match state.fail_after.take() {
            Some((0, err)) => return Err(err),
            Some((passed, err)) => state.fail_after = Some((passed.saturating_sub(1), err)),
            None => {}
        }
        let transaction = SpiTransaction {
            chip_select,
            config,
            bits,
            num_bits,
            readback,
        };
        state.transactions.push(transaction);

        let Some(addr) = transaction.register() else {
            return Ok(0);
        };
        if bits & READ_FLAG == 0 {
            state.registers.insert((chip_select, addr), bits as u8);
            Ok(0)
        } else if readback {
            Ok(u32::from(
                state.registers.get(&(chip_select, addr)).copied().unwrap_or(0),
            ))
        } else {
            Ok(0)
        }
    }
}
