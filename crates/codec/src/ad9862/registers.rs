//! AD9862 register map
//!
//! Source: Analog Devices AD9862 datasheet Rev. A, "Register Map"; bring-up
//! values as used on the USRP1 motherboard.
//!
//! # SPI framing
//!
//! Every access is one 16-bit frame, MSB first, latched on the rising edge:
//!
//! ```text
//!  15   14   13..8      7..0
//! R/W̄   0   addr[5:0]  data[7:0]
//! ```
//!
//! On a read the chip drives the data byte back during the second half of
//! the frame. The part has no multi-register burst mode used here; each
//! register is its own transaction.
//!
//! # Shadow register file
//!
//! The driver keeps a copy of all 64 registers. Fields are modified in the
//! shadow and the containing register is then sent in full, so bits the
//! driver does not touch keep whatever bring-up programmed.

#![allow(missing_docs)] // field constants carry the datasheet names

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// Number of addressable registers.
pub const NUM_REGS: usize = 64;
/// Width of one register transaction.
pub const FRAME_BITS: u8 = 16;
/// Read flag (frame bit 15).
pub const READ_FLAG: u32 = 1 << 15;
/// Register address mask.
pub const ADDR_MASK: u8 = 0x3F;

// ---------------------------------------------------------------------------
// Register addresses
// ---------------------------------------------------------------------------

/// General: SDIO mode, bit order, soft reset
pub const REG_GENERAL: u8 = 0;
/// RX power-down controls
pub const REG_RX_POWER_DOWN: u8 = 1;
/// RX channel A: input buffer bypass, PGA gain
pub const REG_RX_A: u8 = 2;
/// RX channel B: input buffer bypass, PGA gain
pub const REG_RX_B: u8 = 3;
/// RX misc: output format, Hilbert filter
pub const REG_RX_MISC: u8 = 4;
/// TX power-down controls
pub const REG_TX_POWER_DOWN: u8 = 8;
/// TX DAC A coarse gain
pub const REG_DAC_A_GAIN: u8 = 14;
/// TX DAC B coarse gain
pub const REG_DAC_B_GAIN: u8 = 15;
/// TX PGA gain word
pub const REG_TX_PGA: u8 = 16;
/// TX input format: data paths, interleaving, two's complement
pub const REG_TX_MISC: u8 = 17;
/// TX interpolation and Hilbert filter
pub const REG_TX_IF: u8 = 18;
/// TX modulator: coarse/fine mode and sign bits
pub const REG_TX_MODULATOR: u8 = 20;
/// NCO tuning word bits [7:0]
pub const REG_NCO_FTW_7_0: u8 = 21;
/// NCO tuning word bits [15:8]
pub const REG_NCO_FTW_15_8: u8 = 22;
/// NCO tuning word bits [23:16]
pub const REG_NCO_FTW_23_16: u8 = 23;
/// DLL: input clock, multiplier, mode
pub const REG_DLL: u8 = 24;
/// Clock-out dividers
pub const REG_CLKOUT: u8 = 25;
/// Last register written by the bring-up sequence.
pub const REG_INIT_LAST: u8 = REG_CLKOUT;

/// Aux ADC A2 result, bits [1:0] in data bits [7:6]
pub const REG_AUX_ADC_A2_LO: u8 = 26;
/// Aux ADC A2 result, bits [9:2]
pub const REG_AUX_ADC_A2_HI: u8 = 27;
/// Aux ADC A1 result, bits [1:0] in data bits [7:6]
pub const REG_AUX_ADC_A1_LO: u8 = 28;
/// Aux ADC A1 result, bits [9:2]
pub const REG_AUX_ADC_A1_HI: u8 = 29;
/// Aux ADC B2 result, bits [1:0] in data bits [7:6]
pub const REG_AUX_ADC_B2_LO: u8 = 30;
/// Aux ADC B2 result, bits [9:2]
pub const REG_AUX_ADC_B2_HI: u8 = 31;
/// Aux ADC B1 result, bits [1:0] in data bits [7:6]
pub const REG_AUX_ADC_B1_LO: u8 = 32;
/// Aux ADC B1 result, bits [9:2]
pub const REG_AUX_ADC_B1_HI: u8 = 33;
/// Aux ADC control: input mux selects, conversion start, clock
pub const REG_AUX_ADC_CTRL: u8 = 34;

/// Aux DAC A output code
pub const REG_AUX_DAC_A: u8 = 36;
/// Aux DAC B output code
pub const REG_AUX_DAC_B: u8 = 37;
/// Aux DAC C output code
pub const REG_AUX_DAC_C: u8 = 38;
/// Sigma-delta (aux DAC D) bits [3:0] in data bits [7:4]
pub const REG_SIGMA_DELTA_LO: u8 = 42;
/// Sigma-delta (aux DAC D) bits [11:4]
pub const REG_SIGMA_DELTA_HI: u8 = 43;

// ---------------------------------------------------------------------------
// Bit fields
// ---------------------------------------------------------------------------

/// A bit field inside one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Register address
    pub addr: u8,
    /// Position of the least significant bit
    pub offset: u8,
    /// Width in bits (1..=8)
    pub num_bits: u8,
}

impl Field {
    const fn new(addr: u8, offset: u8, num_bits: u8) -> Self {
        Self {
            addr,
            offset,
            num_bits,
        }
    }

    /// Right-aligned mask of the field.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)]
    pub const fn mask(self) -> u8 {
        ((1u16 << self.num_bits) - 1) as u8
    }
}

pub const SDIO_BIDIR: Field = Field::new(REG_GENERAL, 7, 1);
pub const LSB_FIRST: Field = Field::new(REG_GENERAL, 6, 1);
pub const SOFT_RESET: Field = Field::new(REG_GENERAL, 5, 1);

pub const ALL_RX_PD: Field = Field::new(REG_RX_POWER_DOWN, 0, 1);
pub const BUFFER_A_PD: Field = Field::new(REG_RX_POWER_DOWN, 1, 1);
pub const BUFFER_B_PD: Field = Field::new(REG_RX_POWER_DOWN, 2, 1);

pub const BYP_BUFFER_A: Field = Field::new(REG_RX_A, 7, 1);
pub const RX_PGA_A: Field = Field::new(REG_RX_A, 0, 5);
pub const BYP_BUFFER_B: Field = Field::new(REG_RX_B, 7, 1);
pub const RX_PGA_B: Field = Field::new(REG_RX_B, 0, 5);

pub const RX_TWOS_COMP: Field = Field::new(REG_RX_MISC, 3, 1);
pub const RX_HILBERT: Field = Field::new(REG_RX_MISC, 2, 1);

pub const TX_DIGITAL_PD: Field = Field::new(REG_TX_POWER_DOWN, 3, 1);
pub const TX_ANALOG_PD: Field = Field::new(REG_TX_POWER_DOWN, 0, 2);

pub const DAC_A_COARSE_GAIN: Field = Field::new(REG_DAC_A_GAIN, 6, 2);
pub const DAC_B_COARSE_GAIN: Field = Field::new(REG_DAC_B_GAIN, 6, 2);

pub const TX_PGA_GAIN: Field = Field::new(REG_TX_PGA, 0, 8);

pub const TX_TWOS_COMP: Field = Field::new(REG_TX_MISC, 7, 1);
pub const TWO_DATA_PATHS: Field = Field::new(REG_TX_MISC, 6, 1);
pub const INTERLEAVED: Field = Field::new(REG_TX_MISC, 5, 1);

pub const INTERP: Field = Field::new(REG_TX_IF, 0, 2);
pub const TX_HILBERT: Field = Field::new(REG_TX_IF, 2, 1);

pub const COARSE_MOD: Field = Field::new(REG_TX_MODULATOR, 0, 2);
pub const NEG_COARSE_TUNE: Field = Field::new(REG_TX_MODULATOR, 2, 1);
pub const FINE_MODE: Field = Field::new(REG_TX_MODULATOR, 3, 2);
pub const NEG_FINE_TUNE: Field = Field::new(REG_TX_MODULATOR, 5, 1);
pub const FTW_7_0: Field = Field::new(REG_NCO_FTW_7_0, 0, 8);
pub const FTW_15_8: Field = Field::new(REG_NCO_FTW_15_8, 0, 8);
pub const FTW_23_16: Field = Field::new(REG_NCO_FTW_23_16, 0, 8);

pub const INPUT_CLK_CTRL: Field = Field::new(REG_DLL, 6, 1);
pub const DLL_MODE: Field = Field::new(REG_DLL, 5, 1);
pub const DLL_MULT: Field = Field::new(REG_DLL, 3, 2);
pub const CLKOUT2_DIV_FACTOR: Field = Field::new(REG_CLKOUT, 6, 2);

pub const AUX_ADC_LO_BITS: u8 = 6;
pub const START_A: Field = Field::new(REG_AUX_ADC_CTRL, 0, 1);
pub const SELECT_A: Field = Field::new(REG_AUX_ADC_CTRL, 2, 1);
pub const START_B: Field = Field::new(REG_AUX_ADC_CTRL, 4, 1);
pub const SELECT_B: Field = Field::new(REG_AUX_ADC_CTRL, 6, 1);
pub const CLK_4: Field = Field::new(REG_AUX_ADC_CTRL, 7, 1);

pub const AUX_DAC_A: Field = Field::new(REG_AUX_DAC_A, 0, 8);
pub const AUX_DAC_B: Field = Field::new(REG_AUX_DAC_B, 0, 8);
pub const AUX_DAC_C: Field = Field::new(REG_AUX_DAC_C, 0, 8);
pub const SIG_DELT_3_0: Field = Field::new(REG_SIGMA_DELTA_LO, 4, 4);
pub const SIG_DELT_11_4: Field = Field::new(REG_SIGMA_DELTA_HI, 0, 8);

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// SDIO_BIDIR: SDIO carries both directions
pub const SDIO_BIDIR_SDIO: u8 = 1;
/// LSB_FIRST: MSB first
pub const LSB_FIRST_MSB: u8 = 0;
/// RX_HILBERT / TX_HILBERT: filter disabled
pub const HILBERT_DISABLED: u8 = 0;
/// TX_ANALOG_PD: both DAC channels powered down
pub const TX_ANALOG_PD_BOTH: u8 = 0b11;
/// DAC coarse gain: full scale
pub const DAC_COARSE_GAIN_FULL: u8 = 0b11;
/// TWO_DATA_PATHS: both TX paths enabled
pub const TWO_DATA_PATHS_BOTH: u8 = 1;
/// INTERLEAVED: I/Q interleaved on one bus
pub const INTERLEAVED_ON: u8 = 1;

/// COARSE_MOD: coarse modulator bypassed
pub const COARSE_MOD_BYPASS: u8 = 0b00;
/// COARSE_MOD: shift by f_DAC / 8
pub const COARSE_MOD_FDAC_8: u8 = 0b01;
/// COARSE_MOD: shift by f_DAC / 4
pub const COARSE_MOD_FDAC_4: u8 = 0b10;
/// FINE_MODE: NCO bypassed
pub const FINE_MODE_BYPASS: u8 = 0b00;
/// FINE_MODE: NCO enabled
pub const FINE_MODE_NCO: u8 = 0b01;

/// INPUT_CLK_CTRL: clock from the external pin
pub const INPUT_CLK_EXTERNAL: u8 = 1;
/// DLL_MODE: fast
pub const DLL_MODE_FAST: u8 = 1;
/// CLKOUT2_DIV_FACTOR: divide by 2
pub const CLKOUT2_DIV_2: u8 = 0b01;

/// SELECT_A / SELECT_B: route input 2 to the converter
pub const SELECT_AUX_ADC2: u8 = 0;
/// SELECT_A / SELECT_B: route input 1 to the converter
pub const SELECT_AUX_ADC1: u8 = 1;

/// Largest TX PGA gain word.
pub const MAX_TX_PGA_WORD: u8 = 0xFF;
/// Largest RX PGA gain word (20 dB in 1 dB steps).
pub const MAX_RX_PGA_WORD: u8 = 0x14;
/// TX PGA word programmed at bring-up (≈ −4.4 dB).
pub const TX_PGA_WORD_DEFAULT: u8 = 199;

// ---------------------------------------------------------------------------
// Shadow register file
// ---------------------------------------------------------------------------

/// In-memory copy of the chip's registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [u8; NUM_REGS],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self {
            regs: [0; NUM_REGS],
        }
    }
}

impl RegisterFile {
    /// Whole register value.
    #[must_use]
    pub fn reg(&self, addr: u8) -> u8 {
        self.regs
            .get(usize::from(addr & ADDR_MASK))
            .copied()
            .unwrap_or(0)
    }

    /// Overwrite a whole register, e.g. with a value read back from the chip.
    pub fn store(&mut self, addr: u8, value: u8) {
        if let Some(reg) = self.regs.get_mut(usize::from(addr & ADDR_MASK)) {
            *reg = value;
        }
    }

    /// Read a field, right-aligned.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // offset < 8 for every Field
    pub fn get(&self, field: Field) -> u8 {
        (self.reg(field.addr) >> field.offset) & field.mask()
    }

    /// Write a field. Bits of `value` beyond the field width are dropped.
    #[allow(clippy::arithmetic_side_effects)] // offset < 8 for every Field
    pub fn set(&mut self, field: Field, value: u8) {
        let mask = field.mask() << field.offset;
        let reg = (self.reg(field.addr) & !mask) | ((value << field.offset) & mask);
        self.store(field.addr, reg);
    }

    /// Frame that writes register `addr` with its shadow value.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    pub fn write_frame(&self, addr: u8) -> u32 {
        (u32::from(addr & ADDR_MASK) << 8) | u32::from(self.reg(addr))
    }

    /// Frame that reads register `addr`.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    pub fn read_frame(addr: u8) -> u32 {
        READ_FLAG | (u32::from(addr & ADDR_MASK) << 8)
    }
}
