//! Codec integration tests: drive the AD9862 controller through the
//! factory and shared handle, against the recording loopback transport.
// Integration test file: expect/unwrap/panic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
//!
//! Run with: cargo test -p codec --test integration_codec

use std::sync::{Arc, Mutex};
use std::thread;

use codec::ad9862::driver::{AUX_DAC_SCALE, SIGMA_DELTA_SCALE};
use codec::ad9862::registers::{
    REG_AUX_ADC_A2_HI, REG_AUX_ADC_A2_LO, REG_AUX_ADC_CTRL, REG_AUX_DAC_A, REG_AUX_DAC_B,
    REG_AUX_DAC_C, REG_INIT_LAST, REG_RX_A, REG_RX_B, REG_SIGMA_DELTA_HI, REG_SIGMA_DELTA_LO,
    REG_TX_PGA,
};
use codec::ad9862::{self, RX_PGA_GAIN_RANGE, TX_PGA_GAIN_RANGE};
use codec::{AuxAdc, AuxDac, CodecCtrlSptr, CodecError, MockCodec, RxSide};
use platform::config::{SPI_ENABLE_CODEC_A, SPI_ENABLE_CODEC_B};
use platform::{ChipSelect, FixedClock, MockSpiIface, TransportError};

fn codec_on(bus: &Arc<MockSpiIface>, cs: ChipSelect) -> CodecCtrlSptr {
    let codec = ad9862::make(Arc::clone(bus), Arc::new(FixedClock::default()), cs)
        .expect("bring-up on the loopback bus should succeed");
    bus.clear_transactions();
    codec
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("codec=trace")
        .with_test_writer()
        .try_init();
}

/// Two reads of the same input switch the mux exactly once.
#[test]
fn test_repeated_channel_switches_mux_once() {
    init_tracing();
    let bus = Arc::new(MockSpiIface::new());
    let codec = codec_on(&bus, SPI_ENABLE_CODEC_A);
    let mut codec = codec.lock().unwrap();

    codec.read_aux_adc(AuxAdc::B1).unwrap();
    codec.read_aux_adc(AuxAdc::B1).unwrap();

    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_AUX_ADC_CTRL), 1);
}

/// A different input switches again before it is sampled.
#[test]
fn test_channel_change_switches_before_sampling() {
    let bus = Arc::new(MockSpiIface::new());
    let codec = codec_on(&bus, SPI_ENABLE_CODEC_A);
    let mut codec = codec.lock().unwrap();

    codec.read_aux_adc(AuxAdc::A1).unwrap();
    bus.clear_transactions();
    codec.read_aux_adc(AuxAdc::A2).unwrap();

    let log = bus.transactions();
    assert!(log[0].is_write_to(REG_AUX_ADC_CTRL), "mux switch must come first");
    assert!(log[1].is_read_of(REG_AUX_ADC_A2_LO));
    assert!(log[2].is_read_of(REG_AUX_ADC_A2_HI));
    assert_eq!(log.len(), 3);
}

/// The first read after bring-up always switches the mux.
#[test]
fn test_first_read_after_power_up_switches() {
    let bus = Arc::new(MockSpiIface::new());
    let codec = codec_on(&bus, SPI_ENABLE_CODEC_A);
    let mut codec = codec.lock().unwrap();

    // A2 is the select value the chip comes out of reset with.
    codec.read_aux_adc(AuxAdc::A2).unwrap();
    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_AUX_ADC_CTRL), 1);

    codec.power_up().unwrap();
    bus.clear_transactions();
    codec.read_aux_adc(AuxAdc::A2).unwrap();
    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_AUX_ADC_CTRL), 1);
}

/// A bring-up that fails after the soft reset still forgets the old mux setting.
#[test]
fn test_power_up_failing_after_reset_forgets_mux() {
    let bus = Arc::new(MockSpiIface::new());
    let codec = codec_on(&bus, SPI_ENABLE_CODEC_A);
    let mut codec = codec.lock().unwrap();
    codec.read_aux_adc(AuxAdc::A1).unwrap();

    // Soft reset goes through, the first programming frame does not.
    bus.fail_after(1, TransportError::Timeout);
    assert_eq!(
        codec.power_up(),
        Err(CodecError::Transport(TransportError::Timeout))
    );
    assert_eq!(codec.duc_freq(), 0.0);

    bus.clear_transactions();
    codec.read_aux_adc(AuxAdc::A1).unwrap();
    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_AUX_ADC_CTRL), 1);
}

/// A bring-up that fails on its last frame leaves the mux unselected.
#[test]
fn test_power_up_failing_on_last_frame() {
    let bus = Arc::new(MockSpiIface::new());
    let codec = codec_on(&bus, SPI_ENABLE_CODEC_A);
    let mut codec = codec.lock().unwrap();
    codec.read_aux_adc(AuxAdc::B1).unwrap();
    codec.set_tx_pga_gain(0.0).unwrap();

    // Soft reset plus every register up to the clock output.
    let frames_before_aux = usize::from(REG_INIT_LAST) + 2;
    bus.clear_transactions();
    bus.fail_after(frames_before_aux, TransportError::Poisoned);
    assert!(codec.power_up().is_err());
    assert_eq!(bus.transactions().len(), frames_before_aux);
    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_AUX_ADC_CTRL), 0);
    assert_eq!(bus.register(SPI_ENABLE_CODEC_A, REG_TX_PGA), 199);
    assert!(codec.tx_pga_gain() < TX_PGA_GAIN_RANGE.max());

    bus.clear_transactions();
    codec.read_aux_adc(AuxAdc::B1).unwrap();
    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_AUX_ADC_CTRL), 1);
}

/// A sample read that fails after the mux switch keeps the new selection.
#[test]
fn test_read_failure_after_mux_switch_keeps_selection() {
    let bus = Arc::new(MockSpiIface::new());
    let codec = codec_on(&bus, SPI_ENABLE_CODEC_A);
    let mut codec = codec.lock().unwrap();

    // Mux switch succeeds, the low result byte read fails.
    bus.fail_after(1, TransportError::Timeout);
    assert_eq!(
        codec.read_aux_adc(AuxAdc::B2),
        Err(CodecError::Transport(TransportError::Timeout))
    );
    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_AUX_ADC_CTRL), 1);

    bus.clear_transactions();
    codec.read_aux_adc(AuxAdc::B2).unwrap();
    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_AUX_ADC_CTRL), 0);
    assert_eq!(bus.transactions().len(), 2);
}

/// Chip select 0, mid-scale code on A2 → half of 3.3 V.
#[test]
fn test_mid_scale_aux_adc_reads_half_full_scale() {
    let bus = Arc::new(MockSpiIface::new());
    let cs = ChipSelect::new(0);
    let codec = codec_on(&bus, cs);
    bus.set_register(cs, REG_AUX_ADC_A2_LO, 0x00);
    bus.set_register(cs, REG_AUX_ADC_A2_HI, 0x80);

    let volts = codec.lock().unwrap().read_aux_adc(AuxAdc::A2).unwrap();
    assert!((volts - 1.65).abs() < 0.005, "expected ≈1.65 V, got {volts} V");
}

/// Failed mux switch leaves the cache alone, so the next read retries it.
#[test]
fn test_failed_mux_switch_is_retried() {
    let bus = Arc::new(MockSpiIface::new());
    let codec = codec_on(&bus, SPI_ENABLE_CODEC_A);
    let mut codec = codec.lock().unwrap();

    bus.fail_next(TransportError::Timeout);
    assert_eq!(
        codec.read_aux_adc(AuxAdc::B2),
        Err(CodecError::Transport(TransportError::Timeout))
    );
    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_AUX_ADC_CTRL), 0);

    codec.read_aux_adc(AuxAdc::B2).unwrap();
    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_AUX_ADC_CTRL), 1);
}

/// Every aux DAC output reads back within one quantisation step.
#[test]
fn test_aux_dac_loopback_within_one_step() {
    let bus = Arc::new(MockSpiIface::new());
    let cs = SPI_ENABLE_CODEC_B;
    let codec = codec_on(&bus, cs);
    let mut codec = codec.lock().unwrap();

    for channel in AuxDac::ALL {
        for volts in [0.0, 0.42, 1.0, 1.65, 2.718, 3.3] {
            codec.write_aux_dac(channel, volts).unwrap();
            let (code, scale) = match channel {
                AuxDac::A => (bus.register(cs, REG_AUX_DAC_A).into(), AUX_DAC_SCALE),
                AuxDac::B => (bus.register(cs, REG_AUX_DAC_B).into(), AUX_DAC_SCALE),
                AuxDac::C => (bus.register(cs, REG_AUX_DAC_C).into(), AUX_DAC_SCALE),
                AuxDac::D => {
                    let hi = u16::from(bus.register(cs, REG_SIGMA_DELTA_HI));
                    let lo = u16::from(bus.register(cs, REG_SIGMA_DELTA_LO));
                    ((hi << 4) | (lo >> 4), SIGMA_DELTA_SCALE)
                }
            };
            let back = scale.decode(code);
            assert!(
                (back - volts).abs() <= scale.scale(),
                "DAC {channel}: {volts} V came back as {back} V"
            );
        }
    }
}

/// Setting one RX side leaves the other alone.
#[test]
fn test_rx_sides_are_independent() {
    let bus = Arc::new(MockSpiIface::new());
    let codec = codec_on(&bus, SPI_ENABLE_CODEC_A);
    let mut codec = codec.lock().unwrap();

    codec.set_rx_pga_gain(7.0, RxSide::B).unwrap();
    codec.set_rx_pga_gain(15.0, RxSide::A).unwrap();
    assert_eq!(codec.rx_pga_gain(RxSide::B), 7.0);
    assert_eq!(codec.rx_pga_gain(RxSide::A), 15.0);
    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_RX_A), 1);
    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_RX_B), 1);
}

/// RX gain writes keep the buffer bypass bit sharing the register.
#[test]
fn test_rx_gain_preserves_buffer_bypass() {
    let bus = Arc::new(MockSpiIface::new());
    let codec = codec_on(&bus, SPI_ENABLE_CODEC_A);
    let mut codec = codec.lock().unwrap();

    codec.set_rx_pga_gain(20.0, RxSide::A).unwrap();
    assert_eq!(bus.register(SPI_ENABLE_CODEC_A, REG_RX_A), 0x80 | 0x14);
    assert!(codec.adc_buffers_bypassed());

    codec.bypass_adc_buffers(false).unwrap();
    assert_eq!(bus.register(SPI_ENABLE_CODEC_A, REG_RX_A), 0x14);
    assert_eq!(codec.rx_pga_gain(RxSide::A), 20.0);
}

/// Out-of-range gains saturate at the ends of the published ranges.
#[test]
fn test_gains_saturate() {
    let bus = Arc::new(MockSpiIface::new());
    let codec = codec_on(&bus, SPI_ENABLE_CODEC_A);
    let mut codec = codec.lock().unwrap();

    codec.set_tx_pga_gain(6.0).unwrap();
    assert_eq!(codec.tx_pga_gain(), TX_PGA_GAIN_RANGE.max());
    assert_eq!(bus.register(SPI_ENABLE_CODEC_A, REG_TX_PGA), 0xFF);

    codec.set_tx_pga_gain(-100.0).unwrap();
    assert_eq!(codec.tx_pga_gain(), TX_PGA_GAIN_RANGE.min());

    codec.set_rx_pga_gain(42.0, RxSide::A).unwrap();
    assert_eq!(codec.rx_pga_gain(RxSide::A), RX_PGA_GAIN_RANGE.max());
    codec.set_rx_pga_gain(-1.0, RxSide::B).unwrap();
    assert_eq!(codec.rx_pga_gain(RxSide::B), RX_PGA_GAIN_RANGE.min());
}

/// DUC setpoint reports the frequency actually programmed.
#[test]
fn test_duc_reports_tuned_frequency() {
    let bus = Arc::new(MockSpiIface::new());
    let codec = codec_on(&bus, SPI_ENABLE_CODEC_A);
    let mut codec = codec.lock().unwrap();

    assert_eq!(codec.duc_freq(), 0.0);
    codec.set_duc_freq(12.5e6).unwrap();
    let step = 128e6 / 4.0 / f64::from(1u32 << 24);
    assert!((codec.duc_freq() - 12.5e6).abs() <= step);

    let err = codec.set_duc_freq(-60e6).unwrap_err();
    assert!(matches!(err, CodecError::FrequencyOutOfRange { .. }));
    assert!((codec.duc_freq() - 12.5e6).abs() <= step);
}

/// Both codecs share one bus from separate threads.
#[test]
fn test_two_codecs_share_one_bus() {
    let bus = Arc::new(MockSpiIface::new());
    let side_a = codec_on(&bus, SPI_ENABLE_CODEC_A);
    let side_b = codec_on(&bus, SPI_ENABLE_CODEC_B);

    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..50 {
                side_a.lock().unwrap().set_tx_pga_gain(-5.0).unwrap();
            }
        });
        s.spawn(|| {
            for _ in 0..50 {
                side_b.lock().unwrap().set_tx_pga_gain(-15.0).unwrap();
            }
        });
    });

    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_A, REG_TX_PGA), 50);
    assert_eq!(bus.writes_to(SPI_ENABLE_CODEC_B, REG_TX_PGA), 50);
    let word_a = bus.register(SPI_ENABLE_CODEC_A, REG_TX_PGA);
    let word_b = bus.register(SPI_ENABLE_CODEC_B, REG_TX_PGA);
    assert!(word_a > word_b);
}

/// Power-down zeroes every aux DAC and is not undone by dropping the handle.
#[test]
fn test_power_down_then_drop() {
    let bus = Arc::new(MockSpiIface::new());
    let codec = codec_on(&bus, SPI_ENABLE_CODEC_A);
    codec.lock().unwrap().write_aux_dac(AuxDac::B, 3.0).unwrap();
    codec.lock().unwrap().power_down().unwrap();
    assert_eq!(bus.register(SPI_ENABLE_CODEC_A, REG_AUX_DAC_B), 0);

    let writes = bus.transactions().len();
    drop(codec);
    assert_eq!(bus.transactions().len(), writes, "drop must not touch the chip");
}

/// The recording double fits the same shared handle.
#[test]
fn test_mock_codec_behind_shared_handle() {
    let mock = Arc::new(Mutex::new(MockCodec::new()));
    let handle: CodecCtrlSptr = mock.clone();
    {
        let mut codec = handle.lock().unwrap();
        codec.power_up().unwrap();
        codec.read_aux_adc(AuxAdc::A1).unwrap();
        codec.read_aux_adc(AuxAdc::A1).unwrap();
        codec.set_tx_pga_gain(3.0).unwrap();
    }
    let mock = mock.lock().unwrap();
    assert!(mock.powered);
    assert_eq!(mock.mux_switches, 1);
    assert_eq!(mock.tx_gain, 0.0);
}
