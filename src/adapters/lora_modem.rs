//! Wio-E5 LoRa modem adapter (AT command set, point-to-point "TEST" mode).
//!
//! ```text
//!   MCU ──UART 9600 8N1──▶ Wio-E5
//!
//!   AT                                   → +AT: OK
//!   AT+MODE=TEST                         → +MODE: TEST
//!   AT+TEST=RFCFG,916.8,SF9,125,12,12,20,ON,OFF,OFF
//!                                        → +TEST: RFCFG F:916800000, SF9, ...
//!   AT+TEST=TXLRPKT,"4172726976656421"   → +TEST: TXLRPKT "..."
//!                                          +TEST: TX DONE
//!   AT+TEST=RXLRPKT                      → +TEST: RXLRPKT
//!                                          +TEST: LEN:5, RSSI:-41, SNR:11
//!                                          +TEST: RX "5245534554"
//! ```
//!
//! Payloads travel hex-encoded.  Any `ERROR` reply maps to
//! [`RadioError::Protocol`]; silence maps to [`RadioError::Timeout`]; a
//! modem that never answers `AT` is [`RadioError::NotDetected`].

use core::fmt::Write as _;

use log::{debug, warn};

use crate::adapters::serial::{LineRead, SerialLink, read_line};
use crate::app::ports::RadioPort;
use crate::config::LoraConfig;
use crate::error::RadioError;
use crate::queue::{MAX_PACKET_LEN, Packet};

/// Wait for replies to configuration commands.
const COMMAND_TIMEOUT_MS: u32 = 1000;

/// Attempts at the initial `AT` handshake.
const DETECT_ATTEMPTS: u32 = 3;

/// Longest line the modem emits: an RX report of a full packet.
const LINE_LEN: usize = 2 * MAX_PACKET_LEN + 32;

type Line = heapless::String<LINE_LEN>;

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// One line of modem output, as far as the driver cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModemLine {
    /// Handshake reply `+AT: OK`.
    Ok,
    /// `+MODE: TEST`.
    TestMode,
    /// RF configuration echo.
    RfConfigured,
    /// Transmission finished.
    TxDone,
    /// Receiver armed.
    RxArmed,
    /// A received packet.
    Received(Packet),
    /// Any reply containing `ERROR`.
    Error,
    /// Informational output (RSSI reports, echoes, banners).
    Other,
}

/// Classify one line of modem output.
pub fn parse_line(line: &str) -> ModemLine {
    let line = line.trim();
    if line.contains("ERROR") {
        return ModemLine::Error;
    }
    if line == "+AT: OK" {
        return ModemLine::Ok;
    }
    if line.starts_with("+MODE: TEST") {
        return ModemLine::TestMode;
    }
    let Some(rest) = line.strip_prefix("+TEST: ") else {
        return ModemLine::Other;
    };
    if rest.starts_with("RFCFG") {
        ModemLine::RfConfigured
    } else if rest == "TX DONE" {
        ModemLine::TxDone
    } else if rest == "RXLRPKT" {
        ModemLine::RxArmed
    } else if let Some(quoted) = rest.strip_prefix("RX ") {
        match quoted
            .strip_prefix('"')
            .and_then(|q| q.strip_suffix('"'))
            .and_then(hex_decode)
        {
            Some(packet) => ModemLine::Received(packet),
            None => ModemLine::Error,
        }
    } else {
        ModemLine::Other
    }
}

/// Decode an even-length hex string into a packet.
pub fn hex_decode(hex: &str) -> Option<Packet> {
    let bytes = hex.as_bytes();
    if bytes.len() % 2 != 0 || bytes.len() / 2 > MAX_PACKET_LEN {
        return None;
    }
    let mut out = Packet::new();
    for pair in bytes.chunks_exact(2) {
        let hi = hex_digit(pair[0])?;
        let lo = hex_digit(pair[1])?;
        out.push((hi << 4) | lo).ok()?;
    }
    Some(out)
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Render the `TXLRPKT` command for `payload`.
pub fn tx_command(payload: &[u8]) -> String {
    let mut cmd = String::with_capacity(payload.len() * 2 + 24);
    cmd.push_str("AT+TEST=TXLRPKT,\"");
    for b in payload {
        let _ = write!(cmd, "{b:02X}");
    }
    cmd.push_str("\"\r\n");
    cmd
}

/// Render the `RFCFG` command for `cfg`.
///
/// Frequency is given in MHz with trailing zeros trimmed; the preamble
/// length is used for both transmit and receive.
pub fn rfcfg_command(cfg: &LoraConfig) -> heapless::String<80> {
    let on_off = |b: bool| if b { "ON" } else { "OFF" };
    let mhz = cfg.frequency_hz / 1_000_000;
    let frac = cfg.frequency_hz % 1_000_000;
    let mut freq: heapless::String<16> = heapless::String::new();
    let _ = if frac == 0 {
        write!(freq, "{mhz}")
    } else {
        let mut digits: heapless::String<8> = heapless::String::new();
        let _ = write!(digits, "{frac:06}");
        write!(freq, "{mhz}.{}", digits.trim_end_matches('0'))
    };

    let mut cmd = heapless::String::new();
    // Worst case is well under 80 bytes.
    let _ = write!(
        cmd,
        "AT+TEST=RFCFG,{freq},SF{},{},{},{},{},{},{},{}\r\n",
        cfg.spreading_factor,
        cfg.bandwidth_khz,
        cfg.preamble_len,
        cfg.preamble_len,
        cfg.tx_power_dbm,
        on_off(cfg.crc),
        on_off(cfg.iq_inverted),
        on_off(cfg.public_network),
    );
    cmd
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// AT-command LoRa modem on a serial link.
///
/// The modem forgets its RF setup whenever its supply is cut, so
/// [`RadioPort::power_on`] repeats the handshake and configuration.
pub struct LoraModem<L> {
    link: L,
    config: LoraConfig,
    line: Line,
}

impl<L: SerialLink> LoraModem<L> {
    /// Wrap `link` without talking to the modem yet.
    pub fn new(link: L, config: LoraConfig) -> Self {
        Self {
            link,
            config,
            line: Line::new(),
        }
    }

    /// Wrap `link`, detect the modem and apply `config`.
    ///
    /// A modem that does not answer the handshake yields
    /// [`RadioError::NotDetected`].
    pub fn connect(link: L, config: LoraConfig) -> Result<Self, RadioError> {
        let mut modem = Self::new(link, config);
        modem.initialise()?;
        Ok(modem)
    }

    fn initialise(&mut self) -> Result<(), RadioError> {
        self.detect()?;
        self.configure()?;
        debug!(
            "LoRa modem ready ({} Hz, SF{})",
            self.config.frequency_hz, self.config.spreading_factor
        );
        Ok(())
    }

    fn detect(&mut self) -> Result<(), RadioError> {
        for attempt in 1..=DETECT_ATTEMPTS {
            match self.command("AT\r\n", ModemLine::Ok, COMMAND_TIMEOUT_MS) {
                Ok(()) => return Ok(()),
                Err(e) => debug!("modem handshake attempt {attempt} failed: {e}"),
            }
        }
        Err(RadioError::NotDetected)
    }

    /// Switch to point-to-point mode and apply the RF parameters.
    fn configure(&mut self) -> Result<(), RadioError> {
        self.command("AT+MODE=TEST\r\n", ModemLine::TestMode, COMMAND_TIMEOUT_MS)?;
        let cmd = rfcfg_command(&self.config);
        self.command(&cmd, ModemLine::RfConfigured, COMMAND_TIMEOUT_MS)
    }

    #[cfg(test)]
    fn link(&self) -> &L {
        &self.link
    }

    fn send(&mut self, cmd: &str) -> Result<(), RadioError> {
        self.link
            .clear_input()
            .and_then(|()| self.link.write_all(cmd.as_bytes()))
            .map_err(|e| {
                warn!("modem write failed: {e:?}");
                RadioError::Io("uart write")
            })
    }

    /// Next classified line, or `None` after `timeout_ms` of silence.
    fn next_line(&mut self, timeout_ms: u32) -> Result<Option<ModemLine>, RadioError> {
        loop {
            let read = read_line(&mut self.link, &mut self.line, timeout_ms).map_err(|e| {
                warn!("modem read failed: {e:?}");
                RadioError::Io("uart read")
            })?;
            match read {
                LineRead::Line if self.line.is_empty() => continue,
                LineRead::Line => {
                    debug!("modem: {}", self.line);
                    return Ok(Some(parse_line(&self.line)));
                }
                LineRead::TimedOut => return Ok(None),
                LineRead::Overflow => {
                    warn!("modem line too long, discarded");
                    return Err(RadioError::Protocol("line overflow"));
                }
            }
        }
    }

    /// Send `cmd` and wait for `expected`, skipping informational lines.
    fn command(&mut self, cmd: &str, expected: ModemLine, timeout_ms: u32) -> Result<(), RadioError> {
        self.send(cmd)?;
        self.expect(expected, timeout_ms)
    }

    fn expect(&mut self, expected: ModemLine, timeout_ms: u32) -> Result<(), RadioError> {
        loop {
            match self.next_line(timeout_ms)? {
                Some(line) if line == expected => return Ok(()),
                Some(ModemLine::Error) => return Err(RadioError::Protocol("modem replied ERROR")),
                Some(_) => {}
                None => return Err(RadioError::Timeout),
            }
        }
    }
}

impl<L: SerialLink> RadioPort for LoraModem<L> {
    fn power_on(&mut self) -> Result<(), RadioError> {
        self.initialise()
    }

    fn transmit(&mut self, frame: &[u8], timeout_ms: u32) -> Result<(), RadioError> {
        if frame.len() > MAX_PACKET_LEN {
            return Err(RadioError::FrameTooLarge);
        }
        let cmd = tx_command(frame);
        self.send(&cmd)?;
        self.expect(ModemLine::TxDone, timeout_ms)
    }

    fn receive(&mut self, timeout_ms: u32) -> Result<Option<Packet>, RadioError> {
        self.command("AT+TEST=RXLRPKT\r\n", ModemLine::RxArmed, COMMAND_TIMEOUT_MS)?;
        loop {
            match self.next_line(timeout_ms)? {
                Some(ModemLine::Received(packet)) => return Ok(Some(packet)),
                Some(ModemLine::Error) => return Err(RadioError::Protocol("bad RX report")),
                Some(_) => {}
                None => return Ok(None),
            }
        }
    }
}
