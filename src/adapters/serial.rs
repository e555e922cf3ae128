//! Serial link abstraction: the UART between the MCU and the LoRa modem.
//!
//! The modem driver is generic over [`SerialLink`], so it runs against a
//! scripted link on the host and against the ESP-IDF UART driver on the
//! device.

use core::fmt;

/// Byte-oriented, blocking serial channel.
pub trait SerialLink {
    type Error: fmt::Debug;

    /// Write every byte of `data`.
    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Read one byte, waiting at most `timeout_ms`.  `Ok(None)` on timeout.
    fn read_byte(&mut self, timeout_ms: u32) -> Result<Option<u8>, Self::Error>;

    /// Discard anything already buffered on the receive side.
    fn clear_input(&mut self) -> Result<(), Self::Error> {
        while self.read_byte(0)?.is_some() {}
        Ok(())
    }
}

/// Outcome of [`read_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRead {
    /// A full line is in the buffer (terminator stripped).
    Line,
    /// No complete line arrived in time.
    TimedOut,
    /// The line was longer than the buffer; its bytes were discarded.
    Overflow,
}

/// Read one `\n`-terminated line into `line`, dropping `\r`.
///
/// `timeout_ms` bounds the wait for each byte, not the whole line.
/// Non-UTF-8 bytes are replaced with `?`.
pub fn read_line<L: SerialLink, const N: usize>(
    link: &mut L,
    line: &mut heapless::String<N>,
    timeout_ms: u32,
) -> Result<LineRead, L::Error> {
    line.clear();
    let mut overflow = false;
    loop {
        let Some(byte) = link.read_byte(timeout_ms)? else {
            return Ok(LineRead::TimedOut);
        };
        match byte {
            b'\n' => {
                return Ok(if overflow {
                    line.clear();
                    LineRead::Overflow
                } else {
                    LineRead::Line
                });
            }
            b'\r' => {}
            b => {
                let c = if b.is_ascii() { b as char } else { '?' };
                if line.push(c).is_err() {
                    overflow = true;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ESP-IDF UART
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
impl SerialLink for esp_idf_hal::uart::UartDriver<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn write_all(&mut self, mut data: &[u8]) -> Result<(), Self::Error> {
        while !data.is_empty() {
            let n = self.write(data)?;
            data = &data[n..];
        }
        Ok(())
    }

    fn read_byte(&mut self, timeout_ms: u32) -> Result<Option<u8>, Self::Error> {
        let mut byte = [0u8; 1];
        let ticks = esp_idf_hal::delay::TickType::new_millis(u64::from(timeout_ms)).ticks();
        match self.read(&mut byte, ticks)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    fn clear_input(&mut self) -> Result<(), Self::Error> {
        self.clear_rx()
    }
}
