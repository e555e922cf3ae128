//! Node service: the hexagonal core.
//!
//! [`NodeService`] owns the classifier.  It turns sensor edges, inbound
//! commands and heartbeat ticks into [`AppEvent`]s, which leave through
//! whatever [`EventSink`] the caller injects.
//!
//! ```text
//!  EventId ──────▶ ┌──────────────────────────┐ ──▶ EventSink
//!  AppCommand ───▶ │       NodeService         │     (log, telemetry queue)
//!  heartbeat ────▶ │  Classifier · counters    │
//!                  └──────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::fsm::context::ClassificationCounts;
use crate::fsm::states::{ClassificationError, EventId, StateId};

use super::classifier::{Classification, Classifier};
use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::EventSink;

// ───────────────────────────────────────────────────────────────
// NodeService
// ───────────────────────────────────────────────────────────────

pub struct NodeService {
    classifier: Classifier,
}

impl NodeService {
    pub fn new() -> Result<Self, ClassificationError> {
        Ok(Self {
            classifier: Classifier::new()?,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the node.  Call once before the first edge.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        info!("NodeService started in {:?}", self.classifier.state());
        sink.emit(&AppEvent::Started);
    }

    // ── Per-event orchestration ───────────────────────────────

    /// Run one event through the classifier and report its outcome.
    pub fn handle_edge(
        &mut self,
        event: EventId,
        sink: &mut impl EventSink,
    ) -> Option<Classification> {
        if event == EventId::NoOp {
            debug!("ignoring NoOp edge");
            return None;
        }
        let outcome = self.classifier.submit(event)?;
        sink.emit(&AppEvent::Classified {
            outcome,
            counts: *self.classifier.counts(),
        });
        Some(outcome)
    }

    // ── Command handling ──────────────────────────────────────

    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) {
        match cmd {
            AppCommand::ResetCounters => {
                info!("counters reset (were {})", self.classifier.counts());
                self.classifier.reset_counts();
                sink.emit(&AppEvent::CountersReset);
            }
            AppCommand::Status => {
                sink.emit(&AppEvent::Status(*self.classifier.counts()));
            }
        }
    }

    /// Parse a received radio payload and act on it.
    pub fn handle_packet(&mut self, payload: &[u8], sink: &mut impl EventSink) -> Option<AppCommand> {
        match AppCommand::parse(payload) {
            Some(cmd) => {
                info!("command received: {cmd:?}");
                self.handle_command(cmd, sink);
                Some(cmd)
            }
            None => {
                warn!(
                    "ignoring unrecognised payload ({} bytes): {:?}",
                    payload.len(),
                    String::from_utf8_lossy(payload)
                );
                None
            }
        }
    }

    /// Emit a liveness beacon.
    pub fn heartbeat(&mut self, uptime_secs: u64, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Heartbeat { uptime_secs });
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn counts(&self) -> &ClassificationCounts {
        self.classifier.counts()
    }

    pub fn state(&self) -> StateId {
        self.classifier.state()
    }
}
