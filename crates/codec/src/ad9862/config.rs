//! Bring-up configuration

use super::registers::TX_PGA_WORD_DEFAULT;

/// TX interpolation factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Interpolation {
    /// No interpolation
    X1,
    /// ×2
    X2,
    /// ×4 (USRP1 default)
    #[default]
    X4,
    /// ×8
    X8,
}

impl Interpolation {
    /// Value of the INTERP field.
    pub const fn field_value(self) -> u8 {
        match self {
            Self::X1 => 0,
            Self::X2 => 1,
            Self::X4 => 2,
            Self::X8 => 3,
        }
    }
}

/// DLL clock multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DllMult {
    /// ×1
    X1,
    /// ×2 (USRP1 default)
    #[default]
    X2,
    /// ×4
    X4,
}

impl DllMult {
    /// Value of the DLL_MULT field.
    pub const fn field_value(self) -> u8 {
        match self {
            Self::X1 => 0,
            Self::X2 => 1,
            Self::X4 => 2,
        }
    }
}

/// Choices applied by [`CodecCtrl::power_up`](crate::CodecCtrl::power_up).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CodecConfig {
    /// TX interpolation factor
    pub interpolation: Interpolation,
    /// DLL multiplier
    pub dll_mult: DllMult,
    /// Bypass the ADC input buffers after bring-up
    pub bypass_adc_buffers: bool,
    /// Raw TX PGA gain word programmed at bring-up, not a gain in dB
    pub tx_pga_word: u8,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::default(),
            dll_mult: DllMult::default(),
            bypass_adc_buffers: true,
            tx_pga_word: TX_PGA_WORD_DEFAULT,
        }
    }
}
