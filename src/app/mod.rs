//! Application core: domain logic behind port traits, plus the task group
//! that drives it.
//!
//! Classification policy, command handling and telemetry events for a
//! PirLink node.  Hardware is reached only through the **port traits** in
//! [`ports`], so everything except [`tasks`] runs on the host without real
//! peripherals.  [`tasks`] owns the executor, the timers and the thread
//! that wire those pieces to the device.

pub mod classifier;
pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod tasks;
