//! Classification policy around the generic engine.
//!
//! [`Classifier`] owns the classification machine and its counters.  It
//! adds the recovery rule the engine leaves to its caller: a rejected edge
//! bumps the error counter and forces the machine back to `Default`
//! without running `Default`'s action.

use core::fmt;

use log::{info, warn};

use crate::fsm::context::ClassificationCounts;
use crate::fsm::states::{
    ClassificationError, ClassificationMachine, EventId, StateId, classification_machine,
};

/// Outcome of one edge, when it completes something worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Arrived,
    Departed,
    FalseAlarm,
    Error,
}

impl Classification {
    /// Wire name, as sent over the radio.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arrived => "Arrived",
            Self::Departed => "Departed",
            Self::FalseAlarm => "FalseAlarm",
            Self::Error => "Error",
        }
    }

    const fn state(self) -> StateId {
        match self {
            Self::Arrived => StateId::Arrived,
            Self::Departed => StateId::Departed,
            Self::FalseAlarm => StateId::FalseAlarm,
            Self::Error => StateId::Error,
        }
    }

    const ALL: [Self; 4] = [Self::Arrived, Self::Departed, Self::FalseAlarm, Self::Error];
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Classifier {
    machine: ClassificationMachine,
    counts: ClassificationCounts,
}

impl Classifier {
    /// A classifier resting in `Default` with all counters at zero.
    pub fn new() -> Result<Self, ClassificationError> {
        Ok(Self {
            machine: classification_machine()?,
            counts: ClassificationCounts::default(),
        })
    }

    /// Feed one event through the machine.
    ///
    /// Returns the reportable outcome it completed, if any.  Intermediate
    /// states (`Arriving`, `Departing`, `Default`) are only counted.
    pub fn submit(&mut self, event: EventId) -> Option<Classification> {
        let before = self.counts;
        match self.machine.submit(event, &mut self.counts) {
            Ok(()) => {
                let outcome = Classification::ALL
                    .into_iter()
                    .find(|c| self.counts.get(c.state()) > before.get(c.state()));
                if let Some(c) = outcome {
                    info!("classified: {c} ({})", self.counts);
                }
                outcome
            }
            Err(e) => {
                warn!("{e}; forcing Default");
                self.recover();
                Some(Classification::Error)
            }
        }
    }

    /// Clear every counter.  The machine position is untouched.
    pub fn reset_counts(&mut self) {
        self.counts.reset();
    }

    pub fn counts(&self) -> &ClassificationCounts {
        &self.counts
    }

    pub fn state(&self) -> StateId {
        self.machine.current()
    }

    fn recover(&mut self) {
        self.counts.bump(StateId::Error);
        // Default is always in the table, so this cannot fail.
        let _ = self.machine.force(StateId::Default);
    }
}
