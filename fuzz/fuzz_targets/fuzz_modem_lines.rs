//! Fuzz target: modem output parsing
//!
//! Feeds arbitrary bytes through the line reader and the line parser the
//! way the driver does.  Neither may panic, and received packets never
//! exceed the radio's frame limit.
//!
//! cargo fuzz run fuzz_modem_lines

#![no_main]

use std::convert::Infallible;

use libfuzzer_sys::fuzz_target;
use pirlink::adapters::lora_modem::{ModemLine, parse_line};
use pirlink::adapters::serial::{LineRead, SerialLink, read_line};
use pirlink::queue::MAX_PACKET_LEN;

struct Bytes<'a>(&'a [u8]);

impl SerialLink for Bytes<'_> {
    type Error = Infallible;

    fn write_all(&mut self, _data: &[u8]) -> Result<(), Infallible> {
        Ok(())
    }

    fn read_byte(&mut self, _timeout_ms: u32) -> Result<Option<u8>, Infallible> {
        Ok(self.0.split_first().map(|(b, rest)| {
            self.0 = rest;
            *b
        }))
    }
}

fuzz_target!(|data: &[u8]| {
    let mut link = Bytes(data);
    let mut line = heapless::String::<542>::new();
    loop {
        match read_line(&mut link, &mut line, 10) {
            Ok(LineRead::Line) => {
                if let ModemLine::Received(p) = parse_line(&line) {
                    assert!(p.len() <= MAX_PACKET_LEN);
                }
            }
            Ok(LineRead::Overflow) => {}
            Ok(LineRead::TimedOut) | Err(_) => break,
        }
    }
});
