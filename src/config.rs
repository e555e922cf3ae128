//! Node configuration parameters
//!
//! All tunable parameters for a PirLink node.  Every struct is
//! `#[serde(default)]`, so a partial JSON document only overrides the
//! fields it names.  The firmware takes its override from the
//! `PIRLINK_CONFIG` environment variable at build time; nothing is
//! persisted on the device.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::queue::{INBOUND_SLOTS, OUTBOUND_SLOTS};

/// Timeout substituted for a configured value of zero.
pub const FALLBACK_TIMEOUT_MS: u32 = 1000;

/// Maximum length of the node identifier.
pub const NODE_ID_LEN: usize = 16;

// ───────────────────────────────────────────────────────────────
// Radio schedule
// ───────────────────────────────────────────────────────────────

/// Whether a radio cycle always listens, or only wakes to transmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommMode {
    /// Power up every tick, listen for the receive window, then transmit.
    TxRx,
    /// Power up only when something is queued; never listen.
    TxOnly,
}

/// Cadence and timeouts of the duty-cycled radio scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioScheduleConfig {
    /// Seconds between radio cycles.
    pub tick_interval_secs: u32,
    /// Wall-clock length of the receive window (TxRx only).
    pub receive_window_secs: u32,
    /// Per-frame transmit timeout. Zero means [`FALLBACK_TIMEOUT_MS`].
    pub transmit_timeout_ms: u32,
    /// Per-attempt receive timeout. Zero means [`FALLBACK_TIMEOUT_MS`].
    pub receive_timeout_ms: u32,
    pub mode: CommMode,
}

impl Default for RadioScheduleConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 10,
            receive_window_secs: 5,
            transmit_timeout_ms: 5000,
            receive_timeout_ms: 1000,
            mode: CommMode::TxRx,
        }
    }
}

impl RadioScheduleConfig {
    pub fn effective_transmit_timeout_ms(&self) -> u32 {
        non_zero_or_fallback(self.transmit_timeout_ms)
    }

    pub fn effective_receive_timeout_ms(&self) -> u32 {
        non_zero_or_fallback(self.receive_timeout_ms)
    }

    pub fn tick_interval_ms(&self) -> u64 {
        u64::from(self.tick_interval_secs) * 1000
    }

    pub fn receive_window_ms(&self) -> u64 {
        u64::from(self.receive_window_secs) * 1000
    }
}

const fn non_zero_or_fallback(ms: u32) -> u32 {
    if ms == 0 { FALLBACK_TIMEOUT_MS } else { ms }
}

// ───────────────────────────────────────────────────────────────
// LoRa physical layer
// ───────────────────────────────────────────────────────────────

/// RF parameters handed to the LoRa modem at boot.
///
/// Every node and the gateway must agree on all of these.  The modem's
/// test mode fixes the coding rate at 4/5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoraConfig {
    pub frequency_hz: u32,
    /// Spreading factor, 7..=12.
    pub spreading_factor: u8,
    /// Bandwidth in kHz: 125, 250 or 500.
    pub bandwidth_khz: u16,
    pub preamble_len: u16,
    pub tx_power_dbm: i8,
    pub crc: bool,
    pub iq_inverted: bool,
    /// `false` selects the private sync word.
    pub public_network: bool,
}

impl Default for LoraConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 916_800_000,
            spreading_factor: 9,
            bandwidth_khz: 125,
            preamble_len: 12,
            tx_power_dbm: 20,
            crc: true,
            iq_inverted: false,
            public_network: false,
        }
    }
}

impl LoraConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(7..=12).contains(&self.spreading_factor) {
            return Err(ConfigError::Invalid("lora.spreading_factor must be 7..=12"));
        }
        if !matches!(self.bandwidth_khz, 125 | 250 | 500) {
            return Err(ConfigError::Invalid("lora.bandwidth_khz must be 125, 250 or 500"));
        }
        if !(-1..=22).contains(&self.tx_power_dbm) {
            return Err(ConfigError::Invalid("lora.tx_power_dbm must be -1..=22"));
        }
        if !(150_000_000..=960_000_000).contains(&self.frequency_hz) {
            return Err(ConfigError::Invalid("lora.frequency_hz out of band"));
        }
        if self.preamble_len == 0 {
            return Err(ConfigError::Invalid("lora.preamble_len must be non-zero"));
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Whole node
// ───────────────────────────────────────────────────────────────

/// Top-level node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Prefix for heartbeat, status and reset telemetry.
    pub node_id: heapless::String<NODE_ID_LEN>,
    pub radio: RadioScheduleConfig,
    pub lora: LoraConfig,
    /// Soft capacity of the outbound queue (at most `OUTBOUND_SLOTS`).
    pub outbound_queue_capacity: usize,
    /// Soft capacity of the inbound queue (at most `INBOUND_SLOTS`).
    pub inbound_queue_capacity: usize,
    pub heartbeat_interval_secs: u32,
    /// Hours between scheduled restarts. Zero disables them.
    pub reboot_interval_hours: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let mut node_id = heapless::String::new();
        let _ = node_id.push_str("MBX");
        Self {
            node_id,
            radio: RadioScheduleConfig::default(),
            lora: LoraConfig::default(),
            outbound_queue_capacity: OUTBOUND_SLOTS,
            inbound_queue_capacity: INBOUND_SLOTS,
            heartbeat_interval_secs: 60,
            reboot_interval_hours: 12,
        }
    }
}

impl NodeConfig {
    /// Parse a (possibly partial) JSON override and validate the result.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|_| ConfigError::Parse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the firmware cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_id.is_empty() {
            return Err(ConfigError::Invalid("node_id must not be empty"));
        }
        // The id is embedded in outbound messages, which are pipe-delimited.
        if self.node_id.contains('|') {
            return Err(ConfigError::Invalid("node_id must not contain '|'"));
        }
        if self.radio.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid("radio.tick_interval_secs must be non-zero"));
        }
        if self.radio.mode == CommMode::TxRx
            && self.radio.receive_window_secs >= self.radio.tick_interval_secs
        {
            return Err(ConfigError::Invalid(
                "radio.receive_window_secs must be shorter than the tick interval",
            ));
        }
        if self.outbound_queue_capacity == 0 || self.outbound_queue_capacity > OUTBOUND_SLOTS {
            return Err(ConfigError::Invalid("outbound_queue_capacity out of range"));
        }
        if self.inbound_queue_capacity == 0 || self.inbound_queue_capacity > INBOUND_SLOTS {
            return Err(ConfigError::Invalid("inbound_queue_capacity out of range"));
        }
        if self.heartbeat_interval_secs == 0 {
            return Err(ConfigError::Invalid("heartbeat_interval_secs must be non-zero"));
        }
        self.lora.validate()
    }
}

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The JSON document could not be deserialised.
    Parse,
    /// A field failed range validation.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "malformed config JSON"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Parse => Self::Config("malformed config JSON"),
            ConfigError::Invalid(msg) => Self::Config(msg),
        }
    }
}
