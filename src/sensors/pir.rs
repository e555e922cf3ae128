//! PIR motion sensor edge source.
//!
//! Each checkpoint has one PIR sensor wired to a GPIO with an any-edge
//! interrupt.  The ISR reads the pin level and turns it into an
//! [`EventId`]:
//!
//! | Side     | Level high      | Level low        |
//! |----------|-----------------|------------------|
//! | `Arrive` | `ArriveRising`  | `ArriveFalling`  |
//! | `Depart` | `DepartRising`  | `DepartFalling`  |
//!
//! The event is try-pushed onto the shared [`EdgeChannel`]; a full channel
//! drops the edge and bumps its drop counter.

use crate::events::EdgeChannel;
use crate::fsm::states::EventId;

/// Which checkpoint a sensor watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Checkpoint A, tripped first by an arrival.
    Arrive,
    /// Checkpoint B, tripped first by a departure.
    Depart,
}

/// Map a pin level on `side` to its edge event.
pub const fn edge_event(side: Side, high: bool) -> EventId {
    match (side, high) {
        (Side::Arrive, true) => EventId::ArriveRising,
        (Side::Arrive, false) => EventId::ArriveFalling,
        (Side::Depart, true) => EventId::DepartRising,
        (Side::Depart, false) => EventId::DepartFalling,
    }
}

/// One PIR input bound to the edge channel.
///
/// Lives for the whole program: the ISR receives a pointer to it as its
/// argument.
#[derive(Debug)]
pub struct PirSensor {
    side: Side,
    gpio: i32,
    edges: &'static EdgeChannel,
}

impl PirSensor {
    pub const fn new(side: Side, gpio: i32, edges: &'static EdgeChannel) -> Self {
        Self { side, gpio, edges }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Report the pin level seen in the interrupt.  ISR-safe: no logging,
    /// no allocation, never blocks.
    ///
    /// Returns `false` if the edge was dropped.
    pub fn on_level(&self, high: bool) -> bool {
        self.edges.try_push(edge_event(self.side, high))
    }
}
