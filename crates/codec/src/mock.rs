//! Mock codec for host-side testing
//!
//! Implements [`CodecCtrl`] without any transport. Records all calls for
//! assertion in tests, and answers aux ADC reads from programmable levels.
//! Gains are clamped with the same published ranges as the hardware driver
//! but are not quantised.

use crate::ad9862::{RX_PGA_GAIN_RANGE, TX_PGA_GAIN_RANGE};
use crate::{AuxAdc, AuxDac, CodecCtrl, CodecError, RxSide};

/// Mock codec that records all calls for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCodec {
    /// Whether [`CodecCtrl::power_up`] has run (and not been followed by `power_down`)
    pub powered: bool,
    /// Level returned for each aux ADC input, indexed like [`AuxAdc::ALL`]
    pub aux_adc_levels: [f64; 4],
    /// Every aux ADC read, oldest first
    pub aux_adc_reads: Vec<AuxAdc>,
    /// Number of times the input mux would have been switched
    pub mux_switches: usize,
    /// Every aux DAC write as `(channel, volts)`, oldest first
    pub aux_dac_writes: Vec<(AuxDac, f64)>,
    /// TX PGA gain in dB
    pub tx_gain: f64,
    /// RX PGA gains in dB, `[A, B]`
    pub rx_gain: [f64; 2],
    /// DUC frequency in Hz
    pub duc_freq: f64,
    /// ADC buffer bypass flag
    pub buffers_bypassed: bool,
    last_aux_adc: Option<AuxAdc>,
}

impl MockCodec {
    /// Create a new mock codec with sensible defaults.
    pub fn new() -> Self {
        Self {
            powered: false,
            aux_adc_levels: [0.0; 4],
            aux_adc_reads: Vec::new(),
            mux_switches: 0,
            aux_dac_writes: Vec::new(),
            tx_gain: TX_PGA_GAIN_RANGE.min(),
            rx_gain: [RX_PGA_GAIN_RANGE.min(); 2],
            duc_freq: 0.0,
            buffers_bypassed: false,
            last_aux_adc: None,
        }
    }

    /// Set the level the next reads of `channel` return.
    pub fn set_aux_adc_level(&mut self, channel: AuxAdc, volts: f64) {
        if let Some(level) = self.aux_adc_levels.get_mut(adc_index(channel)) {
            *level = volts;
        }
    }
}

impl Default for MockCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn adc_index(channel: AuxAdc) -> usize {
    match channel {
        AuxAdc::A1 => 0,
        AuxAdc::A2 => 1,
        AuxAdc::B1 => 2,
        AuxAdc::B2 => 3,
    }
}

const fn rx_index(side: RxSide) -> usize {
    match side {
        RxSide::A => 0,
        RxSide::B => 1,
    }
}

impl CodecCtrl for MockCodec {
    fn power_up(&mut self) -> Result<(), CodecError> {
        self.powered = true;
        self.last_aux_adc = None;
        self.duc_freq = 0.0;
        Ok(())
    }

    fn power_down(&mut self) -> Result<(), CodecError> {
        for channel in AuxDac::ALL {
            self.write_aux_dac(channel, 0.0)?;
        }
        self.powered = false;
        Ok(())
    }

    #[allow(clippy::arithmetic_side_effects)]
    fn read_aux_adc(&mut self, channel: AuxAdc) -> Result<f64, CodecError> {
        if self.last_aux_adc != Some(channel) {
            self.mux_switches += 1;
            self.last_aux_adc = Some(channel);
        }
        self.aux_adc_reads.push(channel);
        Ok(self
            .aux_adc_levels
            .get(adc_index(channel))
            .copied()
            .unwrap_or(0.0))
    }

    fn write_aux_dac(&mut self, channel: AuxDac, volts: f64) -> Result<(), CodecError> {
        self.aux_dac_writes.push((channel, volts));
        Ok(())
    }

    fn set_tx_pga_gain(&mut self, gain: f64) -> Result<(), CodecError> {
        self.tx_gain = TX_PGA_GAIN_RANGE.clip(gain);
        Ok(())
    }

    fn tx_pga_gain(&self) -> f64 {
        self.tx_gain
    }

    fn set_rx_pga_gain(&mut self, gain: f64, side: RxSide) -> Result<(), CodecError> {
        if let Some(slot) = self.rx_gain.get_mut(rx_index(side)) {
            *slot = RX_PGA_GAIN_RANGE.clip(gain);
        }
        Ok(())
    }

    fn rx_pga_gain(&self, side: RxSide) -> f64 {
        self.rx_gain.get(rx_index(side)).copied().unwrap_or(0.0)
    }

    fn set_duc_freq(&mut self, freq: f64) -> Result<(), CodecError> {
        self.duc_freq = freq;
        Ok(())
    }

    fn duc_freq(&self) -> f64 {
        self.duc_freq
    }

    fn bypass_adc_buffers(&mut self, bypass: bool) -> Result<(), CodecError> {
        self.buffers_bypassed = bypass;
        Ok(())
    }

    fn adc_buffers_bypassed(&self) -> bool {
        self.buffers_bypassed
    }
}
