//! Duty-cycled radio scheduler.
//!
//! The only task that drives the transceiver in normal operation.  It is
//! decoupled from the classifier by the outbound queue: producers enqueue
//! text, and once per tick the scheduler takes as many queued messages as fit
//! one pipe-delimited frame.  Whatever does not fit stays queued, in order,
//! for the next tick.
//!
//! ```text
//!           tick fires
//!   IDLE ───────────────▶ TxOnly and queue empty? ──yes──▶ IDLE (radio stays off)
//!    ▲                           │ no
//!    │                           ▼
//!    │                      POWER ON
//!    │                           │
//!    │                           ▼
//!    │                  RECEIVE WINDOW (TxRx only)
//!    │                  receive(timeout) until the window closes;
//!    │                  each payload → inbound queue
//!    │                           │
//!    │                           ▼
//!    │                   BATCH: take oldest messages while the
//!    │                   '|'-joined frame fits one packet
//!    │                           │
//!    │                           ▼
//!    │                   TRANSMIT (if batch non-empty)
//!    │                           │
//!    │                           ▼
//!    └───────────────────── POWER OFF
//! ```
//!
//! Every runtime radio error is transient: it is logged and the cycle
//! carries on.  Power-off runs on every path once power-on was attempted.

use log::{debug, info, warn};

use crate::app::ports::{RadioPort, TimePort};
use crate::config::{CommMode, RadioScheduleConfig};
use crate::error::RadioError;
use crate::queue::{DELIMITER, InboundQueue, MAX_PACKET_LEN, Message, OutboundQueue};

// ═══════════════════════════════════════════════════════════════
//  Batching
// ═══════════════════════════════════════════════════════════════

/// Join messages into one frame, preserving order.
pub fn batch_frame<I>(messages: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut frame = String::new();
    for (i, m) in messages.into_iter().enumerate() {
        if i > 0 {
            frame.push(DELIMITER);
        }
        frame.push_str(m.as_ref());
    }
    frame
}

// ═══════════════════════════════════════════════════════════════
//  Cycle report
// ═══════════════════════════════════════════════════════════════

/// What one scheduler tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// The radio was powered for this cycle.
    pub powered: bool,
    /// Payloads received and queued inbound.
    pub received: usize,
    /// Payloads received but dropped because the inbound queue was full.
    pub inbound_dropped: usize,
    /// Receive attempts that failed.
    pub receive_errors: usize,
    /// Messages taken into the frame.
    pub batched: usize,
    /// Frame length in bytes (0 if nothing was sent).
    pub frame_len: usize,
    /// Transmit was attempted and succeeded.
    pub transmitted: bool,
    /// Transmit (or power-on) failure, if any.
    pub error: Option<RadioError>,
}

impl CycleReport {
    /// The fast path: nothing to do, radio never touched.
    pub fn skipped(&self) -> bool {
        !self.powered
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

pub struct RadioScheduler<'q, R, T> {
    radio: R,
    clock: T,
    config: RadioScheduleConfig,
    outbound: &'q OutboundQueue,
    inbound: &'q InboundQueue,
    cycles: u64,
}

impl<'q, R: RadioPort, T: TimePort> RadioScheduler<'q, R, T> {
    pub fn new(
        radio: R,
        clock: T,
        config: RadioScheduleConfig,
        outbound: &'q OutboundQueue,
        inbound: &'q InboundQueue,
    ) -> Self {
        Self {
            radio,
            clock,
            config,
            outbound,
            inbound,
            cycles: 0,
        }
    }

    /// Run cycles forever, one per tick interval.
    ///
    /// `on_cycle` sees each report after power-off (the firmware blinks the
    /// run light from it).
    pub fn run(&mut self, mut on_cycle: impl FnMut(&CycleReport)) -> ! {
        let tick = self.config.tick_interval_ms();
        info!(
            "radio scheduler running: every {}s, mode {:?}",
            self.config.tick_interval_secs, self.config.mode
        );
        let mut next = self.clock.now_ms() + tick;
        loop {
            let now = self.clock.now_ms();
            if next > now {
                self.clock.sleep_ms(next - now);
            }
            let report = self.run_cycle();
            on_cycle(&report);

            next += tick;
            // A cycle overran the interval: start counting again from now.
            let now = self.clock.now_ms();
            if next <= now {
                next = now + tick;
            }
        }
    }

    /// One full tick: optional receive window, batch, transmit, power off.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let mut report = CycleReport::default();

        if self.config.mode == CommMode::TxOnly && self.outbound.is_empty() {
            debug!("cycle {}: nothing queued, radio stays off", self.cycles);
            return report;
        }

        report.powered = true;
        debug!("cycle {}: radio on", self.cycles);
        match self.radio.power_on() {
            Ok(()) => self.powered_cycle(&mut report),
            Err(e) => {
                warn!("radio power-on failed: {e}; messages held for next cycle");
                report.error = Some(e);
            }
        }

        if let Err(e) = self.radio.power_off() {
            warn!("radio power-off failed: {e}");
        }
        debug!("cycle {}: radio off", self.cycles);
        report
    }

    fn powered_cycle(&mut self, report: &mut CycleReport) {
        if self.config.mode == CommMode::TxRx {
            self.receive_window(report);
        }

        let batch = self.take_batch();
        let batched = batch.len();
        report.batched = batched;
        if batch.is_empty() {
            return;
        }
        let frame = batch_frame(&batch);
        let left = self.outbound.len();
        if left > 0 {
            debug!("{left} message(s) held for the next cycle");
        }

        info!("TX [{} msgs, {} B]: {}", batched, frame.len(), frame);
        report.frame_len = frame.len();
        match self
            .radio
            .transmit(frame.as_bytes(), self.config.effective_transmit_timeout_ms())
        {
            Ok(()) => report.transmitted = true,
            Err(e) => {
                warn!("transmit failed: {e}; {batched} message(s) lost");
                report.error = Some(e);
            }
        }
    }

    /// Pop the oldest messages while their joined frame fits one packet.
    ///
    /// Bounded by the queue length at entry, so producers racing the batch
    /// cannot keep it open.  A single message always fits.
    fn take_batch(&self) -> Vec<Message> {
        let mut batch = Vec::new();
        let mut frame_len = 0;
        for _ in 0..self.outbound.len() {
            let sep = if batch.is_empty() { 0 } else { DELIMITER.len_utf8() };
            let room = MAX_PACKET_LEN - frame_len;
            match self.outbound.try_pop_if(|m| sep + m.len() <= room) {
                Some(m) => {
                    frame_len += sep + m.len();
                    batch.push(m);
                }
                None => break,
            }
        }
        batch
    }

    /// Listen until the window closes.  Never aborts early.
    fn receive_window(&mut self, report: &mut CycleReport) {
        let timeout = self.config.effective_receive_timeout_ms();
        let deadline = self.clock.now_ms() + self.config.receive_window_ms();

        loop {
            let now = self.clock.now_ms();
            if now >= deadline {
                break;
            }
            match self.radio.receive(timeout) {
                Ok(Some(packet)) => {
                    debug!("RX {} B", packet.len());
                    if self.inbound.try_push(packet) {
                        report.received += 1;
                    } else {
                        report.inbound_dropped += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("receive failed: {e}");
                    report.receive_errors += 1;
                    // Do not spin on a radio that fails instantly.
                    let remaining = deadline.saturating_sub(self.clock.now_ms());
                    self.clock.sleep_ms(remaining.min(u64::from(timeout)));
                }
            }
        }
    }

    /// Cycles run since construction, skipped ones included.
    #[cfg(test)]
    fn cycles(&self) -> u64 {
        self.cycles
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
