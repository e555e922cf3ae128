//! Two-checkpoint classification policy: states, events, actions, table.
//!
//! Sensor **A** sits on the arrival side, sensor **B** on the departure
//! side.  Something crossing A then B has arrived; B then A has departed;
//! a retreat over the same sensor is a false alarm.
//!
//! ```text
//!   DEFAULT ──A↑──▶ ARRIVING ──B↑──▶ ARRIVED ───┐
//!      │               │ A↓                      │
//!      │               ▼                         │
//!      │          FALSE ALARM ──────────────────┼──[Reset]──▶ DEFAULT
//!      │               ▲ B↓                      │
//!      └───B↑──▶ DEPARTING ──A↑──▶ DEPARTED ────┘
//!
//!   DEFAULT also accepts A↓, B↓ and Reset as explicit self-loops.
//!   Anything not drawn is rejected; the classifier counts it as an error
//!   and forces DEFAULT.
//! ```
//!
//! Every state's action bumps that state's counter.  The terminal states
//! (Arrived, Departed, FalseAlarm) return `Reset` so the machine lands back
//! on Default within the same submit.

use super::context::ClassificationCounts;
use super::{Action, EventKind, FsmError, State, StateMachine, StateTable};

// ═══════════════════════════════════════════════════════════════════════════
//  Symbols
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Default = 0,
    Arriving = 1,
    Arrived = 2,
    Departing = 3,
    Departed = 4,
    FalseAlarm = 5,
    /// Reported through the error counter, never entered.
    Error = 6,
}

impl StateId {
    pub const COUNT: usize = 7;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Default,
        Self::Arriving,
        Self::Arrived,
        Self::Departing,
        Self::Departed,
        Self::FalseAlarm,
        Self::Error,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Arriving => "Arriving",
            Self::Arrived => "Arrived",
            Self::Departing => "Departing",
            Self::Departed => "Departed",
            Self::FalseAlarm => "FalseAlarm",
            Self::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventId {
    ArriveRising = 0,
    ArriveFalling = 1,
    DepartRising = 2,
    DepartFalling = 3,
    Reset = 4,
    /// No follow-up.  Never delivered by a sensor.
    NoOp = 5,
}

impl EventId {
    /// The four sensor edges.
    pub const EDGES: [Self; 4] = [
        Self::ArriveRising,
        Self::ArriveFalling,
        Self::DepartRising,
        Self::DepartFalling,
    ];

    pub const fn is_edge(self) -> bool {
        matches!(
            self,
            Self::ArriveRising | Self::ArriveFalling | Self::DepartRising | Self::DepartFalling
        )
    }
}

impl EventKind for EventId {
    const NO_OP: Self = Self::NoOp;
}

// ═══════════════════════════════════════════════════════════════════════════
//  Actions
// ═══════════════════════════════════════════════════════════════════════════

/// Entry action of each classification state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    Default,
    Arriving,
    Arrived,
    Departing,
    Departed,
    FalseAlarm,
}

impl Tally {
    pub const fn state(self) -> StateId {
        match self {
            Self::Default => StateId::Default,
            Self::Arriving => StateId::Arriving,
            Self::Arrived => StateId::Arrived,
            Self::Departing => StateId::Departing,
            Self::Departed => StateId::Departed,
            Self::FalseAlarm => StateId::FalseAlarm,
        }
    }
}

impl Action<ClassificationCounts> for Tally {
    type Event = EventId;

    fn execute(&self, counts: &mut ClassificationCounts) -> EventId {
        counts.bump(self.state());
        match self {
            Self::Arrived | Self::Departed | Self::FalseAlarm => EventId::Reset,
            Self::Default | Self::Arriving | Self::Departing => EventId::NoOp,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub type ClassificationTable = StateTable<StateId, EventId, Tally>;
pub type ClassificationMachine = StateMachine<StateId, EventId, Tally>;
pub type ClassificationError = FsmError<StateId, EventId>;

/// Build the classification table.  Called once at startup.
pub fn build_state_table() -> Result<ClassificationTable, ClassificationError> {
    use EventId::{ArriveFalling, ArriveRising, DepartFalling, DepartRising, Reset};

    let mut t = StateTable::new();

    t.insert(
        StateId::Default,
        State::new(Tally::Default)
            .on(ArriveRising, StateId::Arriving)?
            .on(DepartRising, StateId::Departing)?
            .on(ArriveFalling, StateId::Default)?
            .on(DepartFalling, StateId::Default)?
            .on(Reset, StateId::Default)?,
    )?;

    // Arriving: a second A↑ is rejected; B↓ is not listed either.
    t.insert(
        StateId::Arriving,
        State::new(Tally::Arriving)
            .on(DepartRising, StateId::Arrived)?
            .on(ArriveFalling, StateId::FalseAlarm)?,
    )?;

    t.insert(
        StateId::Arrived,
        State::new(Tally::Arrived).on(Reset, StateId::Default)?,
    )?;

    // Departing: mirror image of Arriving.
    t.insert(
        StateId::Departing,
        State::new(Tally::Departing)
            .on(ArriveRising, StateId::Departed)?
            .on(DepartFalling, StateId::FalseAlarm)?,
    )?;

    t.insert(
        StateId::Departed,
        State::new(Tally::Departed).on(Reset, StateId::Default)?,
    )?;

    t.insert(
        StateId::FalseAlarm,
        State::new(Tally::FalseAlarm).on(Reset, StateId::Default)?,
    )?;

    Ok(t)
}

/// A classification machine resting in `Default`.
pub fn classification_machine() -> Result<ClassificationMachine, ClassificationError> {
    StateMachine::new(build_state_table()?, StateId::Default)
}
