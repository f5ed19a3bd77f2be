//! DUC tuning arithmetic
//!
//! The TX path shifts the baseband up in two stages: a coarse modulator
//! (bypass, ±f_DAC/8 or ±f_DAC/4) followed by a 24-bit NCO that covers the
//! remainder. The coarse band is chosen so the NCO residual stays within
//! ±f_DAC/16 except at the outer edge of the ±f_DAC/4 band.
//!
//! ```text
//!   -max   -limit2  -limit1    0    limit1  limit2    max
//!    |--------|--------|-------|-------|-------|--------|
//!     -rate/4  -rate/8   bypass  bypass  +rate/8  +rate/4
//! ```

use super::registers::{COARSE_MOD_BYPASS, COARSE_MOD_FDAC_4, COARSE_MOD_FDAC_8};

/// Full-scale NCO tuning word.
pub const FTW_MAX: u32 = 0x00FF_FFFF;
/// `2^24`, the NCO phase accumulator modulus.
const FTW_MODULUS: f64 = 16_777_216.0;
/// Reach of the ±rate/4 band beyond its centre, as a fraction of the rate.
const OUTER_REACH: f64 = 0.093_75;

/// Register-level result of a DUC tune.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DucTuning {
    /// COARSE_MOD field value
    pub coarse_mod: u8,
    /// NEG_COARSE_TUNE flag
    pub neg_coarse: bool,
    /// NCO frequency tuning word (24 bits)
    pub ftw: u32,
    /// NEG_FINE_TUNE flag
    pub neg_fine: bool,
    /// Frequency the chip ends up shifted by, in Hz
    pub actual_freq: f64,
}

/// Largest `|freq|` the DUC reaches at `codec_rate`.
pub fn max_freq(codec_rate: f64) -> f64 {
    codec_rate / 4.0 + OUTER_REACH * codec_rate
}

/// Coarse-modulator setting for `freq`: `(field, negative, shift_hz)`.
///
/// `None` when `freq` is out of reach or not a number.
fn coarse_band(freq: f64, codec_rate: f64) -> Option<(u8, bool, f64)> {
    let f1 = codec_rate / 8.0;
    let f2 = codec_rate / 4.0;
    let limit1 = f1 / 2.0;
    let limit2 = (f1 + f2) / 2.0;
    let max = max_freq(codec_rate);

    if freq < -max {
        None
    } else if freq < -limit2 {
        Some((COARSE_MOD_FDAC_4, true, -f2))
    } else if freq < -limit1 {
        Some((COARSE_MOD_FDAC_8, true, -f1))
    } else if freq < limit1 {
        Some((COARSE_MOD_BYPASS, false, 0.0))
    } else if freq < limit2 {
        Some((COARSE_MOD_FDAC_8, false, f1))
    } else if freq <= max {
        Some((COARSE_MOD_FDAC_4, false, f2))
    } else {
        None
    }
}

/// Compute the modulator settings that shift by `freq` Hz.
///
/// `codec_rate` is the DAC sample rate (twice the master clock on the
/// USRP1). Returns `None` when `|freq|` exceeds [`max_freq`].
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn tune(freq: f64, codec_rate: f64) -> Option<DucTuning> {
    let (coarse_mod, neg_coarse, coarse_freq) = coarse_band(freq, codec_rate)?;

    let nco_rate = codec_rate / 4.0;
    let residual = freq - coarse_freq;
    let scaled = ((residual / nco_rate).abs() * FTW_MODULUS).round();
    // Saturating float cast; the min() pins the outer band edge to full scale.
    let ftw = (scaled as u32).min(FTW_MAX);
    let neg_fine = residual < 0.0;

    let fine = f64::from(ftw) * nco_rate / FTW_MODULUS;
    let actual_freq = coarse_freq + if neg_fine { -fine } else { fine };

    Some(DucTuning {
        coarse_mod,
        neg_coarse,
        ftw,
        neg_fine,
        actual_freq,
    })
}
