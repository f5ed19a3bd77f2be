//! Board clock controller abstraction.
//!
//! The codec derives its converter and modulator rates from the master
//! clock generated on the motherboard. Drivers query the clock controller
//! for the current rate rather than caching it, since bring-up may retune
//! the master clock after the drivers are constructed.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::USRP1_MASTER_CLOCK_HZ;

/// Clock-generation controller.
pub trait ClockCtrl {
    /// Current master clock frequency in Hz.
    fn master_clock_freq(&self) -> f64;
}

/// A master clock with a fixed (but re-settable) rate.
///
/// Used for boards without a programmable clock generator, and in tests.
#[derive(Debug)]
pub struct FixedClock {
    bits: AtomicU64,
}

impl FixedClock {
    /// Create a clock running at `freq` Hz.
    pub fn new(freq: f64) -> Self {
        Self {
            bits: AtomicU64::new(freq.to_bits()),
        }
    }

    /// Change the reported master clock rate.
    pub fn set_master_clock_freq(&self, freq: f64) {
        self.bits.store(freq.to_bits(), Ordering::Relaxed);
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new(USRP1_MASTER_CLOCK_HZ)
    }
}

impl ClockCtrl for FixedClock {
    fn master_clock_freq(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}
