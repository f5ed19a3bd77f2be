//! AD9862 hardware driver
//!
//! Talks to the chip through a shared [`SpiIface`], one 16-bit frame per
//! register. All field updates go through a shadow [`RegisterFile`]:
//! a copy is staged, modified, and then committed register by register.
//! The shadow only advances for registers whose write reached the bus, so
//! after a transport failure it still describes what the chip holds.
//!
//! The master clock is queried on every DUC tune, not cached.

use std::sync::Arc;

use platform::{ChipSelect, ClockCtrl, GainRange, LinearScale, SpiConfig, SpiIface};
use tracing::{debug, trace, warn};

use super::config::CodecConfig;
use super::registers::*;
use super::tuning::{max_freq, tune};
use crate::{AuxAdc, AuxDac, CodecCtrl, CodecError, RxSide};

/// TX PGA range: −20 dB to 0 dB in 0.1 dB steps.
pub static TX_PGA_GAIN_RANGE: GainRange = GainRange::new(-20.0, 0.0, 0.1);
/// RX PGA range: 0 dB to 20 dB in 1 dB steps.
pub static RX_PGA_GAIN_RANGE: GainRange = GainRange::new(0.0, 20.0, 1.0);

/// Aux converter full scale.
const AUX_FULL_SCALE_V: f64 = 3.3;
/// 10-bit aux ADC.
pub const AUX_ADC_SCALE: LinearScale = LinearScale::new(AUX_FULL_SCALE_V / 1023.0, 0.0, 0x3FF);
/// 8-bit aux DACs A, B and C.
pub const AUX_DAC_SCALE: LinearScale = LinearScale::new(AUX_FULL_SCALE_V / 255.0, 0.0, 0xFF);
/// 12-bit sigma-delta aux DAC D.
pub const SIGMA_DELTA_SCALE: LinearScale =
    LinearScale::new(AUX_FULL_SCALE_V / 4095.0, 0.0, 0xFFF);

/// Gain in dB → PGA word, clamped to `range`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn gain_to_word(range: &GainRange, max_word: u8, gain: f64) -> u8 {
    let gain = range.clip(gain);
    let word = (f64::from(max_word) * (gain - range.min()) / range.span()).trunc();
    // clip() already pinned gain to the range, so word is in 0..=max_word.
    word.min(f64::from(max_word)) as u8
}

/// PGA word → gain in dB.
fn word_to_gain(range: &GainRange, max_word: u8, word: u8) -> f64 {
    f64::from(word.min(max_word)) * range.span() / f64::from(max_word) + range.min()
}

/// Mux select field and value routing `channel` to its converter.
const fn mux_select(channel: AuxAdc) -> (Field, u8) {
    match channel {
        AuxAdc::A1 => (SELECT_A, SELECT_AUX_ADC1),
        AuxAdc::A2 => (SELECT_A, SELECT_AUX_ADC2),
        AuxAdc::B1 => (SELECT_B, SELECT_AUX_ADC1),
        AuxAdc::B2 => (SELECT_B, SELECT_AUX_ADC2),
    }
}

/// Result registers `(lo, hi)` of `channel`.
const fn result_regs(channel: AuxAdc) -> (u8, u8) {
    match channel {
        AuxAdc::A1 => (REG_AUX_ADC_A1_LO, REG_AUX_ADC_A1_HI),
        AuxAdc::A2 => (REG_AUX_ADC_A2_LO, REG_AUX_ADC_A2_HI),
        AuxAdc::B1 => (REG_AUX_ADC_B1_LO, REG_AUX_ADC_B1_HI),
        AuxAdc::B2 => (REG_AUX_ADC_B2_LO, REG_AUX_ADC_B2_HI),
    }
}

/// 10-bit aux ADC code from its result register pair.
#[allow(clippy::arithmetic_side_effects)]
fn aux_adc_code(lo: u8, hi: u8) -> u16 {
    (u16::from(hi) << 2) | u16::from(lo >> AUX_ADC_LO_BITS)
}

/// AD9862 codec driver.
pub struct Ad9862<B: ?Sized, C: ?Sized> {
    bus: Arc<B>,
    clock: Arc<C>,
    chip_select: ChipSelect,
    config: CodecConfig,
    regs: RegisterFile,
    last_aux_adc: Option<AuxAdc>,
    duc_freq: f64,
}

impl<B: SpiIface + ?Sized, C: ClockCtrl + ?Sized> Ad9862<B, C> {
    /// Bind a driver to `chip_select` on `bus`.
    ///
    /// No transaction is issued; run [`CodecCtrl::power_up`] before use.
    pub fn new(bus: Arc<B>, clock: Arc<C>, chip_select: ChipSelect, config: CodecConfig) -> Self {
        Self {
            bus,
            clock,
            chip_select,
            config,
            regs: RegisterFile::default(),
            last_aux_adc: None,
            duc_freq: 0.0,
        }
    }

    /// Chip select this driver addresses.
    pub fn chip_select(&self) -> ChipSelect {
        self.chip_select
    }

    /// Bring-up configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Shadow copy of the chip's registers.
    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Aux ADC input the mux was last switched to, if known.
    pub fn last_aux_adc(&self) -> Option<AuxAdc> {
        self.last_aux_adc
    }

    fn transport_failed(&self, addr: u8, err: platform::TransportError) -> CodecError {
        warn!(cs = %self.chip_select, addr, error = %err, "AD9862 register access failed");
        CodecError::Transport(err)
    }

    /// Send register `addr` as held in `regs`.
    fn send_reg(&self, regs: &RegisterFile, addr: u8) -> Result<(), CodecError> {
        let frame = regs.write_frame(addr);
        trace!(cs = %self.chip_select, addr, value = regs.reg(addr), "AD9862 write");
        self.bus
            .write_spi(self.chip_select, SpiConfig::RISING_EDGE_MSB_FIRST, frame, FRAME_BITS)
            .map_err(|err| self.transport_failed(addr, err))
    }

    /// Read register `addr` from the chip and record it in the shadow.
    #[allow(clippy::cast_possible_truncation)]
    fn recv_reg(&mut self, addr: u8) -> Result<u8, CodecError> {
        let word = self
            .bus
            .read_spi(
                self.chip_select,
                SpiConfig::RISING_EDGE_MSB_FIRST,
                RegisterFile::read_frame(addr),
                FRAME_BITS,
            )
            .map_err(|err| self.transport_failed(addr, err))?;
        // Data byte is the low half of the captured frame.
        let value = (word & 0xFF) as u8;
        trace!(cs = %self.chip_select, addr, value, "AD9862 read");
        self.regs.store(addr, value);
        Ok(value)
    }

    /// Write `addrs` from `staged`, adopting each register into the shadow
    /// once its write succeeds.
    fn commit(
        &mut self,
        staged: &RegisterFile,
        addrs: impl IntoIterator<Item = u8>,
    ) -> Result<(), CodecError> {
        for addr in addrs {
            self.send_reg(staged, addr)?;
            self.regs.store(addr, staged.reg(addr));
        }
        Ok(())
    }

    fn set_rx_word(&mut self, field: Field, word: u8) -> Result<(), CodecError> {
        let mut staged = self.regs;
        staged.set(field, word);
        self.commit(&staged, [field.addr])
    }

    fn write_aux_dac_8bit(&mut self, field: Field, volts: f64) -> Result<u16, CodecError> {
        let code = AUX_DAC_SCALE.encode(volts);
        let mut staged = self.regs;
        staged.set(field, u8::try_from(code).unwrap_or(u8::MAX));
        self.commit(&staged, [field.addr])?;
        Ok(code)
    }

    /// Aux DAC D: 12 bits split over two registers.
    #[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)]
    fn write_sigma_delta(&mut self, volts: f64) -> Result<u16, CodecError> {
        let code = SIGMA_DELTA_SCALE.encode(volts);
        let mut staged = self.regs;
        staged.set(SIG_DELT_3_0, (code & 0xF) as u8);
        staged.set(SIG_DELT_11_4, (code >> 4) as u8);
        self.commit(&staged, [REG_SIGMA_DELTA_LO, REG_SIGMA_DELTA_HI])?;
        Ok(code)
    }

    /// Codec sample rate: the DACs run at twice the master clock.
    fn codec_rate(&self) -> f64 {
        2.0 * self.clock.master_clock_freq()
    }
}

impl<B: SpiIface + ?Sized, C: ClockCtrl + ?Sized> CodecCtrl for Ad9862<B, C> {
    fn power_up(&mut self) -> Result<(), CodecError> {
        debug!(cs = %self.chip_select, "AD9862 power-up");

        // Soft reset; the bit self-clears in the chip.
        let mut staged = RegisterFile::default();
        staged.set(SOFT_RESET, 1);
        self.commit(&staged, [REG_GENERAL])?;
        staged.set(SOFT_RESET, 0);

        // The chip is back at its reset state from here on, even if
        // programming below fails part way.
        self.regs = RegisterFile::default();
        self.last_aux_adc = None;
        self.duc_freq = 0.0;

        staged.set(SDIO_BIDIR, SDIO_BIDIR_SDIO);
        staged.set(LSB_FIRST, LSB_FIRST_MSB);

        // RX: buffers powered down and bypassed, PGAs at minimum
        let bypass = u8::from(self.config.bypass_adc_buffers);
        staged.set(BUFFER_A_PD, 1);
        staged.set(BUFFER_B_PD, 1);
        staged.set(BYP_BUFFER_A, bypass);
        staged.set(BYP_BUFFER_B, bypass);
        staged.set(RX_PGA_A, 0);
        staged.set(RX_PGA_B, 0);
        staged.set(RX_TWOS_COMP, 1);
        staged.set(RX_HILBERT, HILBERT_DISABLED);

        // TX: both paths, interleaved I/Q, modulators bypassed
        staged.set(TWO_DATA_PATHS, TWO_DATA_PATHS_BOTH);
        staged.set(INTERLEAVED, INTERLEAVED_ON);
        staged.set(TX_TWOS_COMP, 1);
        staged.set(TX_PGA_GAIN, self.config.tx_pga_word);
        staged.set(INTERP, self.config.interpolation.field_value());
        staged.set(TX_HILBERT, HILBERT_DISABLED);
        staged.set(COARSE_MOD, COARSE_MOD_BYPASS);
        staged.set(FINE_MODE, FINE_MODE_BYPASS);
        staged.set(DAC_A_COARSE_GAIN, DAC_COARSE_GAIN_FULL);
        staged.set(DAC_B_COARSE_GAIN, DAC_COARSE_GAIN_FULL);

        // Clocking
        staged.set(INPUT_CLK_CTRL, INPUT_CLK_EXTERNAL);
        staged.set(DLL_MULT, self.config.dll_mult.field_value());
        staged.set(DLL_MODE, DLL_MODE_FAST);
        staged.set(CLKOUT2_DIV_FACTOR, CLKOUT2_DIV_2);

        self.commit(&staged, REG_GENERAL..=REG_INIT_LAST)?;

        // Aux ADCs free-running on the divided clock
        staged.set(START_A, 1);
        staged.set(START_B, 1);
        staged.set(CLK_4, 1);
        self.commit(&staged, [REG_AUX_ADC_CTRL])?;

        debug!(cs = %self.chip_select, "AD9862 power-up complete");
        Ok(())
    }

    fn power_down(&mut self) -> Result<(), CodecError> {
        debug!(cs = %self.chip_select, "AD9862 power-down");
        for channel in AuxDac::ALL {
            self.write_aux_dac(channel, 0.0)?;
        }

        let mut staged = self.regs;
        staged.set(ALL_RX_PD, 1);
        self.commit(&staged, [REG_RX_POWER_DOWN])?;

        staged.set(TX_DIGITAL_PD, 1);
        staged.set(TX_ANALOG_PD, TX_ANALOG_PD_BOTH);
        self.commit(&staged, [REG_TX_POWER_DOWN])
    }

    fn read_aux_adc(&mut self, channel: AuxAdc) -> Result<f64, CodecError> {
        if self.last_aux_adc != Some(channel) {
            let (field, value) = mux_select(channel);
            let mut staged = self.regs;
            staged.set(field, value);
            self.commit(&staged, [REG_AUX_ADC_CTRL])?;
            self.last_aux_adc = Some(channel);
            trace!(cs = %self.chip_select, channel = %channel, "aux ADC mux switched");
        }

        let (lo_addr, hi_addr) = result_regs(channel);
        let lo = self.recv_reg(lo_addr)?;
        let hi = self.recv_reg(hi_addr)?;
        let code = aux_adc_code(lo, hi);
        let volts = AUX_ADC_SCALE.decode(code);
        debug!(cs = %self.chip_select, channel = %channel, code, volts, "aux ADC read");
        Ok(volts)
    }

    fn write_aux_dac(&mut self, channel: AuxDac, volts: f64) -> Result<(), CodecError> {
        let code = match channel {
            AuxDac::A => self.write_aux_dac_8bit(AUX_DAC_A, volts)?,
            AuxDac::B => self.write_aux_dac_8bit(AUX_DAC_B, volts)?,
            AuxDac::C => self.write_aux_dac_8bit(AUX_DAC_C, volts)?,
            AuxDac::D => self.write_sigma_delta(volts)?,
        };
        debug!(cs = %self.chip_select, channel = %channel, volts, code, "aux DAC write");
        Ok(())
    }

    fn set_tx_pga_gain(&mut self, gain: f64) -> Result<(), CodecError> {
        let word = gain_to_word(&TX_PGA_GAIN_RANGE, MAX_TX_PGA_WORD, gain);
        let mut staged = self.regs;
        staged.set(TX_PGA_GAIN, word);
        self.commit(&staged, [REG_TX_PGA])?;
        debug!(cs = %self.chip_select, gain, word, "TX PGA gain set");
        Ok(())
    }

    fn tx_pga_gain(&self) -> f64 {
        word_to_gain(&TX_PGA_GAIN_RANGE, MAX_TX_PGA_WORD, self.regs.get(TX_PGA_GAIN))
    }

    fn set_rx_pga_gain(&mut self, gain: f64, side: RxSide) -> Result<(), CodecError> {
        let word = gain_to_word(&RX_PGA_GAIN_RANGE, MAX_RX_PGA_WORD, gain);
        match side {
            RxSide::A => self.set_rx_word(RX_PGA_A, word)?,
            RxSide::B => self.set_rx_word(RX_PGA_B, word)?,
        }
        debug!(cs = %self.chip_select, side = %side, gain, word, "RX PGA gain set");
        Ok(())
    }

    fn rx_pga_gain(&self, side: RxSide) -> f64 {
        let field = match side {
            RxSide::A => RX_PGA_A,
            RxSide::B => RX_PGA_B,
        };
        word_to_gain(&RX_PGA_GAIN_RANGE, MAX_RX_PGA_WORD, self.regs.get(field))
    }

    #[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)]
    fn set_duc_freq(&mut self, freq: f64) -> Result<(), CodecError> {
        let rate = self.codec_rate();
        let Some(tuning) = tune(freq, rate) else {
            let max = max_freq(rate);
            warn!(cs = %self.chip_select, freq, max, "DUC frequency out of range");
            return Err(CodecError::FrequencyOutOfRange { freq, max });
        };

        let mut staged = self.regs;
        staged.set(COARSE_MOD, tuning.coarse_mod);
        staged.set(NEG_COARSE_TUNE, u8::from(tuning.neg_coarse));
        staged.set(FINE_MODE, FINE_MODE_NCO);
        staged.set(NEG_FINE_TUNE, u8::from(tuning.neg_fine));
        staged.set(FTW_7_0, tuning.ftw as u8);
        staged.set(FTW_15_8, (tuning.ftw >> 8) as u8);
        staged.set(FTW_23_16, (tuning.ftw >> 16) as u8);
        self.commit(
            &staged,
            [
                REG_TX_MODULATOR,
                REG_NCO_FTW_7_0,
                REG_NCO_FTW_15_8,
                REG_NCO_FTW_23_16,
            ],
        )?;

        self.duc_freq = tuning.actual_freq;
        debug!(
            cs = %self.chip_select,
            requested = freq,
            actual = tuning.actual_freq,
            ftw = tuning.ftw,
            "DUC tuned"
        );
        Ok(())
    }

    fn duc_freq(&self) -> f64 {
        self.duc_freq
    }

    fn bypass_adc_buffers(&mut self, bypass: bool) -> Result<(), CodecError> {
        let mut staged = self.regs;
        staged.set(BYP_BUFFER_A, u8::from(bypass));
        staged.set(BYP_BUFFER_B, u8::from(bypass));
        self.commit(&staged, [REG_RX_A, REG_RX_B])?;
        debug!(cs = %self.chip_select, bypass, "ADC buffer bypass");
        Ok(())
    }

    fn adc_buffers_bypassed(&self) -> bool {
        self.regs.get(BYP_BUFFER_A) == 1 && self.regs.get(BYP_BUFFER_B) == 1
    }
}
