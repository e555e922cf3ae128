//! GPIO / peripheral pin assignments for the PirLink node board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// PIR sensors (any-edge interrupts, pulled down)
// ---------------------------------------------------------------------------

/// Checkpoint A: the sensor an arrival trips first.
pub const PIR_ARRIVE_GPIO: i32 = 4;
/// Checkpoint B: the sensor a departure trips first.
pub const PIR_DEPART_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// LoRa modem (Wio-E5 over UART1)
// ---------------------------------------------------------------------------

/// Digital output: HIGH powers the modem through a load switch.
pub const RADIO_ENABLE_GPIO: i32 = 6;
/// MCU TX → modem RX.
pub const LORA_UART_TX_GPIO: i32 = 17;
/// MCU RX ← modem TX.
pub const LORA_UART_RX_GPIO: i32 = 18;
pub const LORA_UART_BAUD: u32 = 9600;

/// Wait after raising the enable pin before the modem accepts commands.
pub const RADIO_SETTLE_MS: u32 = 50;

// ---------------------------------------------------------------------------
// Run light
// ---------------------------------------------------------------------------

pub const RUN_LED_GPIO: i32 = 21;
/// The LED is wired to sink current: LOW lights it.
pub const RUN_LED_ACTIVE_LOW: bool = true;
