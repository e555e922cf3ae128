//! Inbound commands to the node service.
//!
//! Commands arrive as radio payloads during the receive window.  The
//! payload is plain ASCII; surrounding whitespace and case are ignored.

/// Commands a gateway can send to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Zero every classification counter.
    ResetCounters,
    /// Report the current counters.
    Status,
}

impl AppCommand {
    /// Parse a received payload.  Returns `None` for anything unrecognised.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let text = core::str::from_utf8(payload).ok()?.trim();
        if text.eq_ignore_ascii_case("RESET") {
            Some(Self::ResetCounters)
        } else if text.eq_ignore_ascii_case("STATUS") {
            Some(Self::Status)
        } else {
            None
        }
    }
}
