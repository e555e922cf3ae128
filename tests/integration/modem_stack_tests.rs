//! The production radio stack on a fake serial modem:
//! `SharedRadio` → `PoweredRadio` → `LoraModem` → `FakeWioE5`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};

use pirlink::adapters::lora_modem::{LoraModem, hex_decode};
use pirlink::adapters::serial::SerialLink;
use pirlink::app::ports::{RadioPort, TimePort};
use pirlink::config::{CommMode, LoraConfig, RadioScheduleConfig};
use pirlink::error::RadioError;
use pirlink::queue::{InboundQueue, OutboundQueue};
use pirlink::radio::{PoweredRadio, SharedRadio, transmit_once};
use pirlink::scheduler::RadioScheduler;

use crate::mock_radio::SimClock;

// ── Fakes ─────────────────────────────────────────────────────

/// Answers the AT commands the driver uses.  Reads that find nothing to
/// return advance the simulated clock by their timeout.
struct FakeWioE5 {
    present: bool,
    clock: SimClock,
    rx_queue: VecDeque<&'static str>,
    pending: VecDeque<u8>,
    commands: Rc<RefCell<Vec<String>>>,
}

impl FakeWioE5 {
    fn new(clock: SimClock) -> (Self, Rc<RefCell<Vec<String>>>) {
        let commands = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                present: true,
                clock,
                rx_queue: VecDeque::new(),
                pending: VecDeque::new(),
                commands: commands.clone(),
            },
            commands,
        )
    }

    fn reply(&mut self, text: &str) {
        self.pending.extend(text.bytes());
        self.pending.extend(b"\r\n");
    }
}

impl SerialLink for FakeWioE5 {
    type Error = Infallible;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Infallible> {
        let cmd = String::from_utf8_lossy(data).trim_end().to_string();
        self.commands.borrow_mut().push(cmd.clone());
        if !self.present {
            return Ok(());
        }
        if cmd == "AT" {
            self.reply("+AT: OK");
        } else if cmd == "AT+MODE=TEST" {
            self.reply("+MODE: TEST");
        } else if cmd.starts_with("AT+TEST=RFCFG") {
            self.reply("+TEST: RFCFG F:916800000, SF9, BW125K, TXPR:12, RXPR:12, POW:20dBm, CRC:ON, IQ:OFF, NET:OFF");
        } else if let Some(hex) = cmd.strip_prefix("AT+TEST=TXLRPKT,") {
            self.reply(&format!("+TEST: TXLRPKT {hex}"));
            self.reply("+TEST: TX DONE");
        } else if cmd == "AT+TEST=RXLRPKT" {
            self.reply("+TEST: RXLRPKT");
            if let Some(hex) = self.rx_queue.pop_front() {
                self.reply("+TEST: LEN:5, RSSI:-41, SNR:11");
                self.reply(&format!("+TEST: RX \"{hex}\""));
            }
        } else {
            self.reply("+AT: ERROR(-1)");
        }
        Ok(())
    }

    fn read_byte(&mut self, timeout_ms: u32) -> Result<Option<u8>, Infallible> {
        let byte = self.pending.pop_front();
        if byte.is_none() {
            self.clock.advance(u64::from(timeout_ms));
        }
        Ok(byte)
    }

    fn clear_input(&mut self) -> Result<(), Infallible> {
        self.pending.clear();
        Ok(())
    }
}

#[derive(Clone, Default)]
struct EnablePin(Rc<RefCell<Vec<bool>>>);

impl EnablePin {
    fn is_high(&self) -> bool {
        self.0.borrow().last().copied().unwrap_or(false)
    }
}

impl ErrorType for EnablePin {
    type Error = Infallible;
}

impl OutputPin for EnablePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(false);
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(true);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────

#[test]
fn scheduler_drives_modem_through_power_gate() {
    let outbound = OutboundQueue::new();
    let inbound = InboundQueue::new();
    let clock = SimClock::default();
    let (link, commands) = FakeWioE5::new(clock.clone());
    let pin = EnablePin::default();
    let radio = SharedRadio::new(PoweredRadio::new(
        LoraModem::new(link, LoraConfig::default()),
        pin.clone(),
    ));

    let config = RadioScheduleConfig {
        mode: CommMode::TxOnly,
        ..RadioScheduleConfig::default()
    };
    let mut scheduler = RadioScheduler::new(radio.handle(), clock, config, &outbound, &inbound);

    assert!(outbound.enqueue("Arrived"));
    assert!(outbound.enqueue("MBX-HEARTBEAT"));
    let report = scheduler.run_cycle();
    assert!(report.transmitted, "{report:?}");

    let cmds = commands.borrow();
    assert_eq!(cmds[0], "AT");
    assert_eq!(cmds[1], "AT+MODE=TEST");
    assert_eq!(cmds[2], "AT+TEST=RFCFG,916.8,SF9,125,12,12,20,ON,OFF,OFF");
    // "Arrived|MBX-HEARTBEAT"
    assert_eq!(
        cmds[3],
        "AT+TEST=TXLRPKT,\"417272697665647C4D42582D484541525442454154\""
    );
    assert_eq!(cmds.len(), 4);
    assert!(!pin.is_high());
    assert_eq!(*pin.0.borrow(), [false, true, false]);
}

#[test]
fn receive_window_collects_gateway_commands() {
    let outbound = OutboundQueue::new();
    let inbound = InboundQueue::new();
    let clock = SimClock::default();
    let (mut link, _commands) = FakeWioE5::new(clock.clone());
    // "STATUS"
    link.rx_queue.push_back("535441545553");
    let radio = PoweredRadio::new(LoraModem::new(link, LoraConfig::default()), EnablePin::default());

    let mut scheduler = RadioScheduler::new(
        radio,
        clock.clone(),
        RadioScheduleConfig::default(),
        &outbound,
        &inbound,
    );
    let report = scheduler.run_cycle();
    assert_eq!(report.received, 1);
    assert_eq!(report.receive_errors, 0);
    assert!(!report.transmitted);
    assert_eq!(&inbound.try_pop().unwrap()[..], b"STATUS");
    assert!(clock.now_ms() >= 5_000);
}

#[test]
fn missing_modem_is_fatal_and_leaves_power_off() {
    let clock = SimClock::default();
    let (mut link, commands) = FakeWioE5::new(clock);
    link.present = false;
    let pin = EnablePin::default();
    let mut radio = SharedRadio::new(PoweredRadio::new(
        LoraModem::new(link, LoraConfig::default()),
        pin.clone(),
    ));

    let err = transmit_once(&mut radio, b"MBX-ONLINE", 5000).unwrap_err();
    assert_eq!(err, RadioError::NotDetected);
    assert!(err.is_fatal());
    assert!(!pin.is_high());
    assert_eq!(radio.power_users(), 0);
    // Three handshake attempts, nothing else.
    assert_eq!(*commands.borrow(), ["AT", "AT", "AT"]);
}

#[test]
fn backlog_larger_than_a_packet_goes_out_over_two_cycles() {
    let outbound = OutboundQueue::new();
    let inbound = InboundQueue::new();
    let clock = SimClock::default();
    let (link, commands) = FakeWioE5::new(clock.clone());
    let radio = PoweredRadio::new(LoraModem::new(link, LoraConfig::default()), EnablePin::default());
    let config = RadioScheduleConfig {
        mode: CommMode::TxOnly,
        ..RadioScheduleConfig::default()
    };
    let mut scheduler = RadioScheduler::new(radio, clock, config, &outbound, &inbound);

    for _ in 0..40 {
        assert!(outbound.enqueue("Arrived"));
    }
    let first = scheduler.run_cycle();
    assert!(first.transmitted, "{first:?}");
    assert_eq!(first.error, None);
    assert_eq!(outbound.len(), 8);
    let second = scheduler.run_cycle();
    assert!(second.transmitted, "{second:?}");
    assert!(outbound.is_empty());

    let frames: Vec<String> = commands
        .borrow()
        .iter()
        .filter_map(|c| c.strip_prefix("AT+TEST=TXLRPKT,\""))
        .map(|hex| {
            let packet = hex_decode(hex.trim_end_matches('"')).unwrap();
            String::from_utf8(packet.to_vec()).unwrap()
        })
        .collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].len(), 255);
    let sent: Vec<&str> = frames.iter().flat_map(|f| f.split('|')).collect();
    assert_eq!(sent, vec!["Arrived"; 40]);
}

#[test]
fn oversized_batch_is_refused_without_touching_the_air() {
    let clock = SimClock::default();
    let (link, commands) = FakeWioE5::new(clock.clone());
    let mut radio = PoweredRadio::new(LoraModem::new(link, LoraConfig::default()), EnablePin::default());

    radio.power_on().unwrap();
    let frame = vec![b'A'; 300];
    assert_eq!(radio.transmit(&frame, 5000), Err(RadioError::FrameTooLarge));
    radio.power_off().unwrap();
    assert!(commands.borrow().iter().all(|c| !c.starts_with("AT+TEST=TXLRPKT")));
    assert_eq!(clock.now_ms() / 1000, 0);
}
