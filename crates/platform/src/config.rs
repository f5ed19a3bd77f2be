//! Board-level constants for the USRP1 front end.
//!
//! Drivers and bring-up code reference these rather than hardcoding chip
//! selects or clock rates.

use crate::peripheral::ChipSelect;

/// Default master clock of the USRP1 motherboard (64 MHz).
pub const USRP1_MASTER_CLOCK_HZ: f64 = 64e6;

/// SPI enable for codec A (AD9862, side A).
pub const SPI_ENABLE_CODEC_A: ChipSelect = ChipSelect::new(0x02);
/// SPI enable for codec B (AD9862, side B).
pub const SPI_ENABLE_CODEC_B: ChipSelect = ChipSelect::new(0x04);
