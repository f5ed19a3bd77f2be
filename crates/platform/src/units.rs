//! Physical-unit helpers shared by the front-end drivers.
//!
//! - `GainRange`: published `{min, max, step}` of a gain stage, with
//!   saturating clip
//! - `LinearScale`: `volts = code × scale + offset` converter transfer
//!   function, with rounding/clipping encode

/// Gain range of a programmable-gain stage, in dB.
///
/// These are fixed chip characteristics and are published as `static`
/// items by the drivers, never stored per instance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GainRange {
    min: f64,
    max: f64,
    step: f64,
}

impl GainRange {
    /// Create a range. `min` must not exceed `max`.
    #[must_use]
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Lowest gain in dB.
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Highest gain in dB.
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Gain resolution in dB.
    #[must_use]
    pub const fn step(&self) -> f64 {
        self.step
    }

    /// `max - min`.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// `true` if `gain` lies within `[min, max]`.
    #[must_use]
    pub fn contains(&self, gain: f64) -> bool {
        (self.min..=self.max).contains(&gain)
    }

    /// Pull `gain` to the nearest boundary if it lies outside the range.
    ///
    /// NaN clips to `min`.
    #[must_use]
    pub fn clip(&self, gain: f64) -> f64 {
        if gain.is_nan() || gain < self.min {
            self.min
        } else if gain > self.max {
            self.max
        } else {
            gain
        }
    }
}

/// Linear converter transfer function: `volts = code × scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinearScale {
    scale: f64,
    offset: f64,
    max_code: u16,
}

impl LinearScale {
    /// Transfer function with explicit volts-per-code and offset.
    #[must_use]
    pub const fn new(scale: f64, offset: f64, max_code: u16) -> Self {
        Self {
            scale,
            offset,
            max_code,
        }
    }

    /// Unipolar converter spanning `0..=full_scale` volts over `0..=max_code`.
    #[must_use]
    pub fn unipolar(full_scale: f64, max_code: u16) -> Self {
        Self {
            scale: full_scale / f64::from(max_code),
            offset: 0.0,
            max_code,
        }
    }

    /// Volts per code.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Volts at code 0.
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.offset
    }

    /// Largest code the converter produces or accepts.
    #[must_use]
    pub const fn max_code(&self) -> u16 {
        self.max_code
    }

    /// Code → volts. Codes above `max_code` are clipped first.
    #[must_use]
    pub fn decode(&self, code: u16) -> f64 {
        f64::from(code.min(self.max_code)) * self.scale + self.offset
    }

    /// Volts → nearest code, clipped to `0..=max_code`. NaN encodes as 0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn encode(&self, volts: f64) -> u16 {
        let code = ((volts - self.offset) / self.scale).round();
        if code.is_nan() || code <= 0.0 {
            0
        } else if code >= f64::from(self.max_code) {
            self.max_code
        } else {
            // In (0, max_code), so the cast is exact.
            code as u16
        }
    }
}
