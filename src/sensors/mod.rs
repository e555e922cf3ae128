//! Sensor inputs.
//!
//! The node has two PIR sensors, one per checkpoint.  They carry no state
//! beyond their binding to the edge channel; interpretation of the edge
//! sequence belongs to the classifier.

pub mod pir;

pub use pir::{PirSensor, Side, edge_event};
