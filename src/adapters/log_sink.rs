//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | classifier in Default"),
            AppEvent::Classified { outcome, counts } => {
                info!("CLASS | {outcome} | {counts}");
            }
            AppEvent::Heartbeat { uptime_secs } => {
                info!("HEARTBEAT | uptime={uptime_secs}s");
            }
            AppEvent::Status(counts) => info!("STATUS | {counts}"),
            AppEvent::CountersReset => info!("RESET | counters cleared"),
        }
    }
}
