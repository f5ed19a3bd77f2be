//! Front-end codec control for the USRP1
//!
//! The USRP1 motherboard carries two AD9862 mixed-signal front ends. Each
//! one is driven through a [`CodecCtrl`]: power sequencing, auxiliary
//! ADC/DAC access, TX/RX programmable gain, DUC tuning and ADC input-buffer
//! bypass. Requests are made in physical units (volts, dB, Hz) and turned
//! into register transactions on a shared [`platform::SpiIface`].
//!
//! Concrete controllers:
//! - [`ad9862`]: AD9862 hardware driver
//! - [`mock`]: In-process recording double for host tests
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use codec::{ad9862, AuxAdc, RxSide};
//! use platform::{ChipSelect, FixedClock, MockSpiIface};
//!
//! # fn main() -> Result<(), codec::CodecError> {
//! let bus = Arc::new(MockSpiIface::new());
//! let clock = Arc::new(FixedClock::default());
//! let codec = ad9862::make(bus, clock, ChipSelect::new(0x02))?;
//!
//! let mut codec = codec.lock().unwrap();
//! codec.set_rx_pga_gain(10.0, RxSide::A)?;
//! let volts = codec.read_aux_adc(AuxAdc::A2)?;
//! # assert_eq!(volts, 0.0);
//! # Ok(())
//! # }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // prefer tracing over println! in lib code
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod ad9862;
pub mod error;
pub mod mock;

use std::sync::{Arc, Mutex};

pub use error::CodecError;
pub use mock::MockCodec;

/// Auxiliary ADC input.
///
/// The chip has two converters (A and B), each with a two-input mux. The
/// discriminants are the raw identifiers used by board bring-up code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AuxAdc {
    /// Converter A, input 1
    A1 = 0xA1,
    /// Converter A, input 2
    A2 = 0xA2,
    /// Converter B, input 1
    B1 = 0xB1,
    /// Converter B, input 2
    B2 = 0xB2,
}

impl AuxAdc {
    /// Every input, in identifier order.
    pub const ALL: [Self; 4] = [Self::A1, Self::A2, Self::B1, Self::B2];

    /// Short name for log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
        }
    }
}

impl TryFrom<u8> for AuxAdc {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|channel| *channel as u8 == value)
            .ok_or(CodecError::InvalidSelection {
                what: "aux ADC channel",
                value: u32::from(value),
            })
    }
}

impl core::fmt::Display for AuxAdc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auxiliary DAC output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AuxDac {
    /// 8-bit output A
    A = 0xA,
    /// 8-bit output B
    B = 0xB,
    /// 8-bit output C
    C = 0xC,
    /// 12-bit sigma-delta output D
    D = 0xD,
}

impl AuxDac {
    /// Every output, in identifier order.
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Short name for log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl TryFrom<u8> for AuxDac {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|channel| *channel as u8 == value)
            .ok_or(CodecError::InvalidSelection {
                what: "aux DAC channel",
                value: u32::from(value),
            })
    }
}

impl core::fmt::Display for AuxDac {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receive path whose PGA is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxSide {
    /// RX channel A
    A,
    /// RX channel B
    B,
}

impl RxSide {
    /// Short name for log output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

/// Accepts `'A'`/`'a'` and `'B'`/`'b'`.
impl TryFrom<char> for RxSide {
    type Error = CodecError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase() {
            'A' => Ok(Self::A),
            'B' => Ok(Self::B),
            _ => Err(CodecError::InvalidSelection {
                what: "RX side",
                value: u32::from(value),
            }),
        }
    }
}

impl core::fmt::Display for RxSide {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control interface of one front-end codec.
///
/// Gains out of range are clamped to the nearest end of the published
/// range ([`ad9862::TX_PGA_GAIN_RANGE`], [`ad9862::RX_PGA_GAIN_RANGE`]),
/// never rejected. Transport failures propagate as
/// [`CodecError::Transport`] and are not retried.
pub trait CodecCtrl {
    /// Run the bring-up sequence. Called by the factory.
    fn power_up(&mut self) -> Result<(), CodecError>;

    /// Zero the aux DACs and power down the RX and TX paths.
    fn power_down(&mut self) -> Result<(), CodecError>;

    /// Sample an aux ADC input, in volts.
    ///
    /// The input mux is only switched when `channel` differs from the
    /// previously sampled one.
    fn read_aux_adc(&mut self, channel: AuxAdc) -> Result<f64, CodecError>;

    /// Drive an aux DAC output to `volts`, clipped to the output range.
    fn write_aux_dac(&mut self, channel: AuxDac, volts: f64) -> Result<(), CodecError>;

    /// Set the TX PGA gain in dB.
    fn set_tx_pga_gain(&mut self, gain: f64) -> Result<(), CodecError>;

    /// Current TX PGA gain in dB, as quantised by the chip.
    fn tx_pga_gain(&self) -> f64;

    /// Set the RX PGA gain of one side in dB.
    fn set_rx_pga_gain(&mut self, gain: f64, side: RxSide) -> Result<(), CodecError>;

    /// Current RX PGA gain of one side in dB, as quantised by the chip.
    fn rx_pga_gain(&self, side: RxSide) -> f64;

    /// Tune the digital up-converter to `freq` Hz (negative shifts down).
    fn set_duc_freq(&mut self, freq: f64) -> Result<(), CodecError>;

    /// Frequency the DUC is actually tuned to, in Hz.
    fn duc_freq(&self) -> f64;

    /// Bypass (`true`) or use the ADC input buffers on both RX sides.
    fn bypass_adc_buffers(&mut self, bypass: bool) -> Result<(), CodecError>;

    /// Whether the ADC input buffers are bypassed.
    fn adc_buffers_bypassed(&self) -> bool;
}

/// Shared handle to a codec controller.
///
/// The mutex is the only serialisation of controller state; the transport
/// serialises the bus on its own.
pub type CodecCtrlSptr = Arc<Mutex<dyn CodecCtrl + Send>>;
