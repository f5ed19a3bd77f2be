//! Register-transaction transport abstraction
//!
//! Codec and synthesizer drivers on the front-end board talk to their chips
//! through a shared serial bus. Each device sits behind its own chip-select
//! line; a transaction shifts `num_bits` of a word out (MSB first unless
//! configured otherwise) and optionally captures the bits shifted back in.
//!
//! The transport is the only place bus access is serialised. Drivers hold it
//! behind a shared handle and call it through `&self`.

use std::sync::Mutex;

use embedded_hal::spi::{Error as _, ErrorKind, SpiDevice};

/// Chip-select line identifying one device on the shared bus.
///
/// The value is whatever the transport uses to address the device: a line
/// index, or a one-hot enable mask as on the USRP1 (see
/// [`config`](crate::config)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct ChipSelect(u8);

impl ChipSelect {
    /// Wrap a raw chip-select value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Return the raw chip-select value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl core::fmt::Display for ChipSelect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "cs{:#04x}", self.0)
    }
}

/// SPI configuration for a single transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// SPI mode (CPOL, CPHA)
    pub mode: SpiMode,
    /// Bit order
    pub bit_order: BitOrder,
}

impl SpiConfig {
    /// Data changes on the falling edge and is latched on the rising edge,
    /// MSB first. This is what the AD9862 and the daughterboard parts expect.
    pub const RISING_EDGE_MSB_FIRST: Self = Self {
        mode: SpiMode::Mode0,
        bit_order: BitOrder::MsbFirst,
    };
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self::RISING_EDGE_MSB_FIRST
    }
}

/// SPI modes (CPOL, CPHA)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiMode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl core::fmt::Display for SpiMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let n = match self {
            Self::Mode0 => 0,
            Self::Mode1 => 1,
            Self::Mode2 => 2,
            Self::Mode3 => 3,
        };
        write!(f, "mode {n}")
    }
}

/// Bit order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    /// Most significant bit first
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

/// Failure of a register transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The bus reported an error while shifting the frame.
    #[error("SPI bus error: {0}")]
    Bus(ErrorKind),
    /// Nothing answers on the requested chip select.
    #[error("no device on {0}")]
    NoDevice(ChipSelect),
    /// The transaction width is not supported by this transport.
    #[error("unsupported transaction width: {0} bits")]
    InvalidWidth(u8),
    /// The device was set up for a different SPI mode than requested.
    #[error("{chip_select} is wired for SPI {configured}, not {requested}")]
    ModeMismatch {
        /// Device the transaction was for.
        chip_select: ChipSelect,
        /// Mode the device was attached with.
        configured: SpiMode,
        /// Mode the transaction asked for.
        requested: SpiMode,
    },
    /// The transaction did not complete in time.
    #[error("transaction timed out")]
    Timeout,
    /// Another thread panicked while holding the bus.
    #[error("bus lock poisoned")]
    Poisoned,
}

/// Synchronous register-transaction transport.
///
/// Implementations must serialise concurrent transactions: several drivers,
/// each bound to its own chip select, may share one transport across
/// threads.
pub trait SpiIface {
    /// Shift the low `num_bits` of `bits` out to `chip_select`.
    ///
    /// When `readback` is set, returns the bits captured during the same
    /// frame (right-aligned). Otherwise returns 0.
    fn transact_spi(
        &self,
        chip_select: ChipSelect,
        config: SpiConfig,
        bits: u32,
        num_bits: u8,
        readback: bool,
    ) -> Result<u32, TransportError>;

    /// Write-only transaction.
    fn write_spi(
        &self,
        chip_select: ChipSelect,
        config: SpiConfig,
        bits: u32,
        num_bits: u8,
    ) -> Result<(), TransportError> {
        self.transact_spi(chip_select, config, bits, num_bits, false)
            .map(|_| ())
    }

    /// Transaction with readback.
    fn read_spi(
        &self,
        chip_select: ChipSelect,
        config: SpiConfig,
        bits: u32,
        num_bits: u8,
    ) -> Result<u32, TransportError> {
        self.transact_spi(chip_select, config, bits, num_bits, true)
    }
}

/// [`SpiIface`] over a set of embedded-hal [`SpiDevice`]s.
///
/// Each device already owns its chip-select pin; this adapter maps a
/// [`ChipSelect`] to the device and frames the word into bytes. Bus access
/// is serialised with a mutex. The SPI mode is fixed when a device is
/// created, so it is recorded on attach and a transaction asking for a
/// different [`SpiConfig::mode`] fails with
/// [`TransportError::ModeMismatch`]. [`SpiConfig::bit_order`] is honoured
/// per transaction.
pub struct HalSpiIface<D> {
    devices: Mutex<Vec<Attached<D>>>,
}

struct Attached<D> {
    chip_select: ChipSelect,
    mode: SpiMode,
    device: D,
}

impl<D: SpiDevice> HalSpiIface<D> {
    /// Longest frame this adapter can shift.
    pub const MAX_BITS: u8 = 32;

    /// Create an adapter with no devices attached.
    pub fn new() -> Self {
        Self {
            devices: Mutex::new(Vec::new()),
        }
    }

    /// Attach a mode 0 `device` under `chip_select`, replacing any previous one.
    pub fn with_device(self, chip_select: ChipSelect, device: D) -> Self {
        self.with_device_in_mode(chip_select, SpiMode::Mode0, device)
    }

    /// Attach `device`, configured for `mode`, under `chip_select`.
    pub fn with_device_in_mode(self, chip_select: ChipSelect, mode: SpiMode, device: D) -> Self {
        if let Ok(mut devices) = self.devices.lock() {
            devices.retain(|attached| attached.chip_select != chip_select);
            devices.push(Attached {
                chip_select,
                mode,
                device,
            });
        }
        self
    }

    /// Release the attached devices.
    pub fn into_devices(self) -> Vec<(ChipSelect, D)> {
        self.devices
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .into_iter()
            .map(|attached| (attached.chip_select, attached.device))
            .collect()
    }
}

impl<D: SpiDevice> Default for HalSpiIface<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Right-aligned word → big-endian frame bytes, honouring bit order.
#[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)]
fn frame_bytes(bits: u32, num_bits: u8, order: BitOrder) -> ([u8; 4], usize) {
    let len = usize::from(num_bits.div_ceil(8));
    let pad = 32 - u32::from(num_bits);
    // Left-align so the first bit on the wire is the MSB of byte 0.
    let aligned = match order {
        BitOrder::MsbFirst => bits << pad,
        BitOrder::LsbFirst => (bits << pad).reverse_bits() << pad,
    };
    (aligned.to_be_bytes(), len)
}

/// Inverse of [`frame_bytes`] for the captured frame.
#[allow(clippy::arithmetic_side_effects)]
fn unframe_bytes(bytes: [u8; 4], num_bits: u8, order: BitOrder) -> u32 {
    let pad = 32 - u32::from(num_bits);
    let aligned = u32::from_be_bytes(bytes);
    match order {
        BitOrder::MsbFirst => aligned >> pad,
        BitOrder::LsbFirst => (aligned >> pad).reverse_bits() >> pad,
    }
}

impl<D: SpiDevice> SpiIface for HalSpiIface<D> {
    fn transact_spi(
        &self,
        chip_select: ChipSelect,
        config: SpiConfig,
        bits: u32,
        num_bits: u8,
        readback: bool,
    ) -> Result<u32, TransportError> {
        if num_bits == 0 || num_bits > Self::MAX_BITS {
            return Err(TransportError::InvalidWidth(num_bits));
        }
        let (mut frame, len) = frame_bytes(bits, num_bits, config.bit_order);

        let mut devices = self.devices.lock().map_err(|_| TransportError::Poisoned)?;
        let attached = devices
            .iter_mut()
            .find(|attached| attached.chip_select == chip_select)
            .ok_or(TransportError::NoDevice(chip_select))?;
        if attached.mode != config.mode {
            return Err(TransportError::ModeMismatch {
                chip_select,
                configured: attached.mode,
                requested: config.mode,
            });
        }
        let device = &mut attached.device;
        let buf = frame
            .get_mut(..len)
            .ok_or(TransportError::InvalidWidth(num_bits))?;

        if readback {
            device
                .transfer_in_place(buf)
                .map_err(|e| TransportError::Bus(e.kind()))?;
            Ok(unframe_bytes(frame, num_bits, config.bit_order))
        } else {
            device
                .write(buf)
                .map_err(|e| TransportError::Bus(e.kind()))?;
            Ok(0)
        }
    }
}
