//! Outbound application events.
//!
//! The [`NodeService`](super::service::NodeService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: write a log line, or render telemetry
//! text onto the outbound radio queue.

use crate::fsm::context::ClassificationCounts;

use super::classifier::Classification;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started; the node announces itself.
    Started,

    /// An edge completed a reportable classification.
    Classified {
        outcome: Classification,
        counts: ClassificationCounts,
    },

    /// Periodic liveness beacon.
    Heartbeat { uptime_secs: u64 },

    /// Reply to a `STATUS` command.
    Status(ClassificationCounts),

    /// Counters were cleared by a `RESET` command.
    CountersReset,
}
