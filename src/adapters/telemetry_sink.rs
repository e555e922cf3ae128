//! Radio telemetry sink adapter.
//!
//! Implements [`EventSink`] by rendering each [`AppEvent`] as the short
//! text the gateway expects and enqueueing it for the radio scheduler.
//!
//! | Event            | Wire text                                   |
//! |------------------|---------------------------------------------|
//! | `Started`        | `<node>-ONLINE`                             |
//! | `Classified`     | `Arrived` / `Departed` / `FalseAlarm` / `Error` |
//! | `Heartbeat`      | `<node>-HEARTBEAT`                          |
//! | `Status`         | `<node>-STATUS d=.. a=.. A=.. p=.. P=.. f=.. e=..` |
//! | `CountersReset`  | `<node>-RESET`                              |

use core::fmt::Write as _;

use log::debug;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::config::NODE_ID_LEN;
use crate::queue::{MAX_MESSAGE_LEN, OutboundQueue};

/// Render `event` as outbound wire text.
pub fn render(node_id: &str, event: &AppEvent) -> heapless::String<MAX_MESSAGE_LEN> {
    let mut text = heapless::String::new();
    // Every rendering fits: node ids are at most 16 bytes and validated.
    let _ = match event {
        AppEvent::Started => write!(text, "{node_id}-ONLINE"),
        AppEvent::Classified { outcome, .. } => text.write_str(outcome.as_str()),
        AppEvent::Heartbeat { .. } => write!(text, "{node_id}-HEARTBEAT"),
        AppEvent::Status(counts) => write!(text, "{node_id}-STATUS {counts}"),
        AppEvent::CountersReset => write!(text, "{node_id}-RESET"),
    };
    text
}

/// Queues every event for transmission.
pub struct TelemetrySink<'q> {
    node_id: heapless::String<NODE_ID_LEN>,
    outbound: &'q OutboundQueue,
    /// `Started` is announced directly at boot, so it can be skipped here.
    announce_start: bool,
}

impl<'q> TelemetrySink<'q> {
    pub fn new(node_id: &str, outbound: &'q OutboundQueue) -> Self {
        let mut id = heapless::String::new();
        for c in node_id.chars() {
            if id.push(c).is_err() {
                break;
            }
        }
        Self {
            node_id: id,
            outbound,
            announce_start: true,
        }
    }

    /// Do not queue `<node>-ONLINE` when the service starts.
    pub fn without_start_announcement(mut self) -> Self {
        self.announce_start = false;
        self
    }
}

impl EventSink for TelemetrySink<'_> {
    fn emit(&mut self, event: &AppEvent) {
        if matches!(event, AppEvent::Started) && !self.announce_start {
            return;
        }
        let text = render(&self.node_id, event);
        if !self.outbound.enqueue(&text) {
            debug!("telemetry dropped: {text}");
        }
    }
}
