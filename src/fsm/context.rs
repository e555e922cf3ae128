//! Running tally threaded through every classification action.
//!
//! `ClassificationCounts` is the event context of the classification
//! machine: one counter per state plus the error counter the policy bumps
//! on rejection.  Counters only grow until [`ClassificationCounts::reset`].

use core::fmt;

use super::states::StateId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationCounts {
    pub default: u32,
    pub arriving: u32,
    pub arrived: u32,
    pub departing: u32,
    pub departed: u32,
    pub false_alarm: u32,
    pub error: u32,
}

impl ClassificationCounts {
    /// Counter for `state`.
    pub fn get(&self, state: StateId) -> u32 {
        match state {
            StateId::Default => self.default,
            StateId::Arriving => self.arriving,
            StateId::Arrived => self.arrived,
            StateId::Departing => self.departing,
            StateId::Departed => self.departed,
            StateId::FalseAlarm => self.false_alarm,
            StateId::Error => self.error,
        }
    }

    /// Increment the counter for `state`.
    pub fn bump(&mut self, state: StateId) {
        let slot = match state {
            StateId::Default => &mut self.default,
            StateId::Arriving => &mut self.arriving,
            StateId::Arrived => &mut self.arrived,
            StateId::Departing => &mut self.departing,
            StateId::Departed => &mut self.departed,
            StateId::FalseAlarm => &mut self.false_alarm,
            StateId::Error => &mut self.error,
        };
        *slot = slot.saturating_add(1);
    }

    /// Clear every counter to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        StateId::ALL.iter().map(|s| u64::from(self.get(*s))).sum()
    }
}

/// Compact form used in `STATUS` telemetry: `d=1 a=1 A=1 p=0 P=0 f=0 e=0`.
///
/// Lower case is the approaching state, upper case the completed one.
impl fmt::Display for ClassificationCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "d={} a={} A={} p={} P={} f={} e={}",
            self.default,
            self.arriving,
            self.arrived,
            self.departing,
            self.departed,
            self.false_alarm,
            self.error
        )
    }
}
