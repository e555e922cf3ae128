//! Port traits: the boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService / RadioScheduler (domain)
//! ```
//!
//! Driven adapters (the LoRa modem, the clock, log and telemetry sinks)
//! implement these traits.  The domain consumes them via generics, so it
//! never touches hardware directly and runs unchanged against mocks on the
//! host.

use crate::error::RadioError;
use crate::queue::Packet;

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Fan an event out to two sinks, left first.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: domain ↔ transceiver)
// ───────────────────────────────────────────────────────────────

/// A half-duplex packet radio.
///
/// Every operation carries its own timeout and blocks for at most that
/// long; there is no cancellation.  Implementations are not reentrant.
pub trait RadioPort {
    /// Energise the transceiver.  Radios without power control do nothing.
    fn power_on(&mut self) -> Result<(), RadioError> {
        Ok(())
    }

    /// De-energise the transceiver.
    fn power_off(&mut self) -> Result<(), RadioError> {
        Ok(())
    }

    /// Send one frame.
    fn transmit(&mut self, frame: &[u8], timeout_ms: u32) -> Result<(), RadioError>;

    /// Listen for one packet.  `Ok(None)` means the timeout elapsed quietly.
    fn receive(&mut self, timeout_ms: u32) -> Result<Option<Packet>, RadioError>;
}

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: domain ← clock)
// ───────────────────────────────────────────────────────────────

/// Monotonic clock plus a blocking delay.
pub trait TimePort {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds.
    fn sleep_ms(&self, ms: u64);
}
