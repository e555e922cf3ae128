//! Mock adapters for integration tests.
//!
//! `MockRadio` records every call and serves scripted inbound packets;
//! `SimClock` is a manual clock that `sleep_ms` advances, so scheduler
//! cycles run instantly.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use pirlink::app::events::AppEvent;
use pirlink::app::ports::{EventSink, RadioPort, TimePort};
use pirlink::error::RadioError;
use pirlink::queue::Packet;

// ── Clock ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl TimePort for SimClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }

    fn sleep_ms(&self, ms: u64) {
        self.advance(ms);
    }
}

// ── Radio ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCall {
    PowerOn,
    PowerOff,
    Transmit(String),
    Receive,
}

/// Shared view of what the radio saw, kept after the radio moves into a
/// scheduler.
#[derive(Clone, Default)]
pub struct RadioLog(Rc<RefCell<Vec<RadioCall>>>);

#[allow(dead_code)]
impl RadioLog {
    pub fn calls(&self) -> Vec<RadioCall> {
        self.0.borrow().clone()
    }

    pub fn frames(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                RadioCall::Transmit(f) => Some(f.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub struct MockRadio {
    clock: SimClock,
    log: RadioLog,
    inbound: Rc<RefCell<VecDeque<&'static [u8]>>>,
}

#[allow(dead_code)]
impl MockRadio {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            log: RadioLog::default(),
            inbound: Rc::default(),
        }
    }

    pub fn log(&self) -> RadioLog {
        self.log.clone()
    }

    /// Handle for scripting packets the gateway will send.
    pub fn air(&self) -> Rc<RefCell<VecDeque<&'static [u8]>>> {
        self.inbound.clone()
    }
}

impl RadioPort for MockRadio {
    fn power_on(&mut self) -> Result<(), RadioError> {
        self.log.0.borrow_mut().push(RadioCall::PowerOn);
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), RadioError> {
        self.log.0.borrow_mut().push(RadioCall::PowerOff);
        Ok(())
    }

    fn transmit(&mut self, frame: &[u8], _timeout_ms: u32) -> Result<(), RadioError> {
        let text = String::from_utf8_lossy(frame).into_owned();
        self.log.0.borrow_mut().push(RadioCall::Transmit(text));
        Ok(())
    }

    fn receive(&mut self, timeout_ms: u32) -> Result<Option<Packet>, RadioError> {
        self.log.0.borrow_mut().push(RadioCall::Receive);
        match self.inbound.borrow_mut().pop_front() {
            Some(bytes) => {
                self.clock.advance(10);
                Ok(Packet::from_slice(bytes).ok())
            }
            None => {
                self.clock.advance(u64::from(timeout_ms));
                Ok(None)
            }
        }
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
