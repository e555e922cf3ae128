//! Table-driven finite state machine engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌──────────┬──────────┬────────────────────────────────┐    │
//! │  │ StateId  │ action   │ transitions (EventId → StateId) │    │
//! │  ├──────────┼──────────┼────────────────────────────────┤    │
//! │  │ S0       │ A0       │ e1 → S1, e2 → S0                │    │
//! │  │ S1       │ A1       │ e3 → S2                         │    │
//! │  │ S2       │ A2       │ reset → S0                      │    │
//! │  └──────────┴──────────┴────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`StateMachine::submit`] looks the event up in the current state's
//! transition map.  An absent entry is a rejection: the engine leaves
//! `current` untouched and returns [`FsmError::EventRejected`], so the
//! caller's policy decides how to recover.  A present entry moves the
//! machine and runs the target state's [`Action`], which may return a
//! follow-up event.  Follow-ups are fed back through the same lookup in a
//! bounded loop (at most [`MAX_CASCADE`] steps) until an action returns the
//! event type's `NO_OP` sentinel.
//!
//! The engine is generic over the state and event symbols, the action type
//! and the caller-owned context.  The context is only borrowed for the
//! duration of one `submit`.

pub mod context;
pub mod states;

use core::fmt;

use heapless::LinearMap;
use log::debug;

/// Upper bound on states in one table.
pub const MAX_STATES: usize = 8;

/// Upper bound on outgoing transitions per state.
pub const MAX_TRANSITIONS: usize = 8;

/// Upper bound on transitions taken by a single `submit`, follow-ups included.
pub const MAX_CASCADE: usize = 8;

// ---------------------------------------------------------------------------
// Symbols and actions
// ---------------------------------------------------------------------------

/// An event symbol with a reserved "no follow-up" value.
pub trait EventKind: Copy + Eq + fmt::Debug {
    /// Returned by an action that does not want to fire another event.
    const NO_OP: Self;
}

/// Work performed when a state is entered.
///
/// The returned event is submitted next, unless it is [`EventKind::NO_OP`].
pub trait Action<C> {
    type Event: EventKind;

    fn execute(&self, ctx: &mut C) -> Self::Event;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmError<S, E> {
    /// `state` has no transition for `event`.
    EventRejected { state: S, event: E },
    /// Follow-up events kept firing past [`MAX_CASCADE`].
    CascadeLimit { state: S, event: E },
    /// A state id is referenced but not present in the table.
    UnknownState(S),
    /// A state id was inserted twice.
    DuplicateState(S),
    /// A table or transition map is at capacity.
    TableFull,
}

impl<S: fmt::Debug, E: fmt::Debug> fmt::Display for FsmError<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventRejected { state, event } => {
                write!(f, "event {event:?} rejected in state {state:?}")
            }
            Self::CascadeLimit { state, event } => {
                write!(f, "follow-up cascade exceeded {MAX_CASCADE} steps at {state:?} on {event:?}")
            }
            Self::UnknownState(s) => write!(f, "unknown state {s:?}"),
            Self::DuplicateState(s) => write!(f, "state {s:?} defined twice"),
            Self::TableFull => write!(f, "state table full"),
        }
    }
}

impl<S: fmt::Debug, E: fmt::Debug> std::error::Error for FsmError<S, E> {}

// ---------------------------------------------------------------------------
// State (one row in the table)
// ---------------------------------------------------------------------------

/// One state: its entry action and the events it is prepared to accept.
pub struct State<S, E, A> {
    action: A,
    transitions: LinearMap<E, S, MAX_TRANSITIONS>,
}

impl<S: Copy + Eq + fmt::Debug, E: Copy + Eq + fmt::Debug, A> State<S, E, A> {
    /// A state that accepts nothing until transitions are added with [`on`](Self::on).
    pub fn new(action: A) -> Self {
        Self {
            action,
            transitions: LinearMap::new(),
        }
    }

    /// Accept `event`, moving to `target`.  A later call for the same event
    /// replaces the earlier target.
    pub fn on(mut self, event: E, target: S) -> Result<Self, FsmError<S, E>> {
        self.transitions
            .insert(event, target)
            .map_err(|_| FsmError::TableFull)?;
        Ok(self)
    }

    /// Where `event` leads from this state, if anywhere.
    pub fn target(&self, event: &E) -> Option<S> {
        self.transitions.get(event).copied()
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    fn targets(&self) -> impl Iterator<Item = &S> {
        self.transitions.values()
    }
}

// ---------------------------------------------------------------------------
// State table
// ---------------------------------------------------------------------------

/// The full set of states, keyed by id.
pub struct StateTable<S, E, A> {
    states: LinearMap<S, State<S, E, A>, MAX_STATES>,
}

impl<S: Copy + Eq + fmt::Debug, E: Copy + Eq + fmt::Debug, A> StateTable<S, E, A> {
    pub fn new() -> Self {
        Self {
            states: LinearMap::new(),
        }
    }

    /// Add a state.  Each id may appear only once.
    pub fn insert(&mut self, id: S, state: State<S, E, A>) -> Result<(), FsmError<S, E>> {
        if self.states.contains_key(&id) {
            return Err(FsmError::DuplicateState(id));
        }
        self.states
            .insert(id, state)
            .map_err(|_| FsmError::TableFull)?;
        Ok(())
    }

    pub fn get(&self, id: &S) -> Option<&State<S, E, A>> {
        self.states.get(id)
    }

    pub fn contains(&self, id: &S) -> bool {
        self.states.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Every transition target must itself be a state in the table.
    fn check_closed(&self) -> Result<(), FsmError<S, E>> {
        for state in self.states.values() {
            if let Some(missing) = state.targets().find(|t| !self.states.contains_key(t)) {
                return Err(FsmError::UnknownState(*missing));
            }
        }
        Ok(())
    }
}

impl<S: Copy + Eq + fmt::Debug, E: Copy + Eq + fmt::Debug, A> Default for StateTable<S, E, A> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Invariant: `current` and `previous` are always keys of `table`.
pub struct StateMachine<S, E, A> {
    table: StateTable<S, E, A>,
    current: S,
    previous: S,
}

impl<S, E, A> StateMachine<S, E, A>
where
    S: Copy + Eq + fmt::Debug,
    E: EventKind,
{
    /// Construct a machine resting in `initial`.  No action runs.
    ///
    /// Fails if `initial` or any transition target is missing from `table`.
    pub fn new(table: StateTable<S, E, A>, initial: S) -> Result<Self, FsmError<S, E>> {
        if !table.contains(&initial) {
            return Err(FsmError::UnknownState(initial));
        }
        table.check_closed()?;
        Ok(Self {
            table,
            current: initial,
            previous: initial,
        })
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn previous(&self) -> S {
        self.previous
    }

    /// `true` if the current state has a transition for `event`.
    pub fn accepts(&self, event: E) -> bool {
        self.table
            .get(&self.current)
            .is_some_and(|s| s.target(&event).is_some())
    }

    pub fn table(&self) -> &StateTable<S, E, A> {
        &self.table
    }

    /// Deliver `event`, then any follow-ups the entered states' actions
    /// return, until one returns `NO_OP`.
    ///
    /// A rejection of the initial event leaves the machine untouched.  A
    /// rejection part-way through a cascade leaves it in the last state
    /// entered.
    pub fn submit<C>(&mut self, event: E, ctx: &mut C) -> Result<(), FsmError<S, E>>
    where
        A: Action<C, Event = E>,
    {
        let mut event = event;
        for _ in 0..MAX_CASCADE {
            let from = self.current;
            let target = self
                .table
                .get(&from)
                .ok_or(FsmError::UnknownState(from))?
                .target(&event)
                .ok_or(FsmError::EventRejected { state: from, event })?;
            let entered = self.table.get(&target).ok_or(FsmError::UnknownState(target))?;

            debug!("FSM transition: {from:?} --{event:?}--> {target:?}");
            self.previous = from;
            self.current = target;

            let follow_up = entered.action().execute(ctx);
            if follow_up == E::NO_OP {
                return Ok(());
            }
            event = follow_up;
        }
        Err(FsmError::CascadeLimit {
            state: self.current,
            event,
        })
    }

    /// Jump straight to `state` without running its action.
    pub fn force(&mut self, state: S) -> Result<(), FsmError<S, E>> {
        if !self.table.contains(&state) {
            return Err(FsmError::UnknownState(state));
        }
        if state != self.current {
            debug!("FSM forced: {:?} -> {state:?}", self.current);
        }
        self.previous = self.current;
        self.current = state;
        Ok(())
    }
}
