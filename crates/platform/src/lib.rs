//! Hardware Abstraction Layer (HAL) for the USRP1 front end
//!
//! This crate provides the trait-based seams the chip drivers are written
//! against, so they can be developed and tested without a board attached.
//!
//! # Architecture Layers
//!
//! ```text
//! Device bring-up / tuning API
//!         ↓
//! Chip drivers (ad9862 codec, …)
//!         ↓
//! Platform HAL (this crate - transport and clock traits)
//!         ↓
//! USB control transport / embedded-hal SPI
//! ```
//!
//! # Contents
//!
//! - [`SpiIface`] - synchronous register-transaction transport
//! - [`ClockCtrl`] - master clock query
//! - [`units`] - gain ranges and converter transfer functions
//! - [`config`] - board chip selects and default clock
//! - `mocks` - recording transport (`mock` feature)
//!
//! # Features
//!
//! - `mock`: Export the recording transport for downstream tests
//! - `defmt`: Enable `defmt::Format` derives
//!
//! # Example
//!
//! ```
//! use platform::{ChipSelect, SpiConfig, SpiIface, TransportError};
//!
//! fn poke<T: SpiIface>(bus: &T, cs: ChipSelect) -> Result<(), TransportError> {
//!     bus.write_spi(cs, SpiConfig::default(), 0x0020, 16)
//! }
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
#![allow(clippy::must_use_candidate)] // hardware accessors; callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod clock;
pub mod config;
pub mod mocks;
pub mod peripheral;
pub mod units;

pub use clock::{ClockCtrl, FixedClock};
pub use peripheral::{
    BitOrder, ChipSelect, HalSpiIface, SpiConfig, SpiIface, SpiMode, TransportError,
};
pub use units::{GainRange, LinearScale};

#[cfg(any(test, feature = "mock"))]
pub use mocks::{MockSpiIface, SpiTransaction};
