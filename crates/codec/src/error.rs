//! Codec controller errors

use platform::TransportError;

/// Error returned by [`CodecCtrl`](crate::CodecCtrl) operations and the
/// channel/side conversions.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// The register transport failed. Not retried.
    #[error("codec transport failure: {0}")]
    Transport(#[from] TransportError),

    /// A raw identifier did not name a channel or side.
    #[error("invalid {what} selection: {value:#x}")]
    InvalidSelection {
        /// Which enumeration was being converted to
        what: &'static str,
        /// The rejected raw value
        value: u32,
    },

    /// The DUC cannot reach the requested frequency.
    #[error("DUC frequency {freq} Hz outside ±{max} Hz")]
    FrequencyOutOfRange {
        /// Requested frequency in Hz
        freq: f64,
        /// Largest reachable magnitude in Hz at the current clock
        max: f64,
    },
}
