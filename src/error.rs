//! Unified error types for the PirLink firmware.
//!
//! A single `Error` enum that the radio and configuration layers convert
//! into, keeping the top-level reporting in `main` uniform.  All variants are `Copy` so
//! they can be passed between tasks and logged without allocation.
//!
//! Only one condition is fatal: the LoRa radio not answering at boot.
//! Everything the radio reports at runtime is transient and is logged by
//! the scheduler, then retried naturally on the next tick.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The radio transceiver failed.
    Radio(RadioError),
    /// Configuration is invalid or could not be parsed.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Radio errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The transceiver did not answer the detection probe.
    NotDetected,
    /// The operation did not complete within its timeout.
    Timeout,
    /// Another task holds the radio (or its lock was poisoned).
    Busy,
    /// The frame exceeds what the transceiver can send in one packet.
    FrameTooLarge,
    /// The underlying bus (UART/SPI) reported an error.
    Io(&'static str),
    /// The transceiver answered with something we do not understand.
    Protocol(&'static str),
}

impl RadioError {
    /// `true` only for the boot-time "device not detected" condition.
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::NotDetected)
    }
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDetected => write!(f, "transceiver not detected"),
            Self::Timeout => write!(f, "timed out"),
            Self::Busy => write!(f, "radio busy"),
            Self::FrameTooLarge => write!(f, "frame too large"),
            Self::Io(msg) => write!(f, "bus error: {msg}"),
            Self::Protocol(msg) => write!(f, "unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for RadioError {}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
