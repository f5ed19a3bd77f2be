//! Analog Devices AD9862 front-end codec
//!
//! Two of these sit on the USRP1 motherboard, one per side, each behind its
//! own SPI enable ([`platform::config::SPI_ENABLE_CODEC_A`] /
//! [`platform::config::SPI_ENABLE_CODEC_B`]). Device bring-up creates one
//! controller per chip with [`make`] and shares the returned handle with the
//! daughterboard and DSP code that needs it.

pub mod config;
pub mod driver;
pub mod registers;
pub mod tuning;

use std::sync::{Arc, Mutex};

use platform::{ChipSelect, ClockCtrl, SpiIface};

pub use config::{CodecConfig, DllMult, Interpolation};
pub use driver::{Ad9862, RX_PGA_GAIN_RANGE, TX_PGA_GAIN_RANGE};

use crate::{CodecCtrl, CodecCtrlSptr, CodecError};

/// Create and power up the codec behind `chip_select`, with the USRP1
/// default bring-up.
pub fn make<B, C>(
    bus: Arc<B>,
    clock: Arc<C>,
    chip_select: ChipSelect,
) -> Result<CodecCtrlSptr, CodecError>
where
    B: SpiIface + Send + Sync + ?Sized + 'static,
    C: ClockCtrl + Send + Sync + ?Sized + 'static,
{
    make_with_config(bus, clock, chip_select, CodecConfig::default())
}

/// [`make`] with an explicit bring-up configuration.
pub fn make_with_config<B, C>(
    bus: Arc<B>,
    clock: Arc<C>,
    chip_select: ChipSelect,
    config: CodecConfig,
) -> Result<CodecCtrlSptr, CodecError>
where
    B: SpiIface + Send + Sync + ?Sized + 'static,
    C: ClockCtrl + Send + Sync + ?Sized + 'static,
{
    let mut codec = Ad9862::new(bus, clock, chip_select, config);
    codec.power_up()?;
    Ok(Arc::new(Mutex::new(codec)))
}
