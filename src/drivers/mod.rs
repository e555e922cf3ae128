//! Hardware initialisation, output drivers, and task helpers.

pub mod hw_init;
pub mod status_led;
pub mod task_pin;
pub mod watchdog;
