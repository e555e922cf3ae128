//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter          | Implements  | Connects to                     |
//! |------------------|-------------|---------------------------------|
//! | `log_sink`       | EventSink   | Serial log output               |
//! | `telemetry_sink` | EventSink   | Outbound radio queue            |
//! | `lora_modem`     | RadioPort   | Wio-E5 AT modem over UART       |
//! | `serial`         | SerialLink  | ESP-IDF UART driver             |
//! | `time`           | TimePort    | ESP-IDF high-resolution timer   |

pub mod log_sink;
pub mod lora_modem;
pub mod serial;
pub mod telemetry_sink;
pub mod time;
