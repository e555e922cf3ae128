//! Radio wrappers layered over any [`RadioPort`].
//!
//! ```text
//!  boot announcer ──┐
//!                   ├──▶ SharedRadio ──▶ PoweredRadio ──▶ LoRa modem
//!  RadioScheduler ──┘     (mutex,        (enable pin)
//!                          power refs)
//! ```
//!
//! [`PoweredRadio`] gates the transceiver's supply through an enable GPIO.
//! [`SharedRadio`] lets more than one task hold a handle: every operation
//! runs under a mutex because the transceiver is half-duplex and not
//! reentrant, and power is reference counted so one user powering off
//! cannot cut another user's session short.

use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::digital::OutputPin;
use log::{debug, warn};

use crate::app::ports::RadioPort;
use crate::error::RadioError;
use crate::queue::Packet;

// ───────────────────────────────────────────────────────────────
// One-shot transmit
// ───────────────────────────────────────────────────────────────

/// Power on, send one frame, power off.  Power-off runs even when the
/// transmit fails.
pub fn transmit_once(
    radio: &mut impl RadioPort,
    frame: &[u8],
    timeout_ms: u32,
) -> Result<(), RadioError> {
    let result = radio
        .power_on()
        .and_then(|()| radio.transmit(frame, timeout_ms));
    if let Err(e) = radio.power_off() {
        warn!("radio power-off failed: {e}");
    }
    result
}

// ───────────────────────────────────────────────────────────────
// Enable-pin power gating
// ───────────────────────────────────────────────────────────────

/// Drives `enable` high while the radio is in use.
pub struct PoweredRadio<R, P> {
    radio: R,
    enable: P,
    /// Milliseconds to wait after raising the enable pin.
    settle_ms: u32,
    delay: fn(u32),
}

impl<R: RadioPort, P: OutputPin> PoweredRadio<R, P> {
    /// Wrap `radio`, starting with the enable pin low.
    pub fn new(radio: R, mut enable: P) -> Self {
        if enable.set_low().is_err() {
            warn!("radio enable pin: initial set_low failed");
        }
        Self {
            radio,
            enable,
            settle_ms: 0,
            delay: |_| {},
        }
    }

    /// Wait `settle_ms` (via `delay`) after power-on before the first command.
    pub fn with_settle(mut self, settle_ms: u32, delay: fn(u32)) -> Self {
        self.settle_ms = settle_ms;
        self.delay = delay;
        self
    }

    #[cfg(test)]
    fn inner(&self) -> &R {
        &self.radio
    }
}

impl<R: RadioPort, P: OutputPin> RadioPort for PoweredRadio<R, P> {
    fn power_on(&mut self) -> Result<(), RadioError> {
        self.enable
            .set_high()
            .map_err(|_| RadioError::Io("enable pin"))?;
        if self.settle_ms > 0 {
            (self.delay)(self.settle_ms);
        }
        let result = self.radio.power_on();
        // A radio that failed to come up is not left powered.
        if result.is_err() && self.enable.set_low().is_err() {
            warn!("radio enable pin: set_low after failed power-on failed");
        }
        result
    }

    fn power_off(&mut self) -> Result<(), RadioError> {
        // Let the inner radio wind down first, but cut power regardless.
        let inner = self.radio.power_off();
        self.enable
            .set_low()
            .map_err(|_| RadioError::Io("enable pin"))?;
        inner
    }

    fn transmit(&mut self, frame: &[u8], timeout_ms: u32) -> Result<(), RadioError> {
        self.radio.transmit(frame, timeout_ms)
    }

    fn receive(&mut self, timeout_ms: u32) -> Result<Option<Packet>, RadioError> {
        self.radio.receive(timeout_ms)
    }
}

// ───────────────────────────────────────────────────────────────
// Mutex-serialised sharing
// ───────────────────────────────────────────────────────────────

struct Shared<R> {
    radio: R,
    power_users: u32,
}

/// A cloneable handle to one transceiver.
pub struct SharedRadio<R: RadioPort> {
    inner: Arc<Mutex<Shared<R>>>,
    /// Whether this handle currently holds a power reference.
    powered: bool,
}

impl<R: RadioPort> SharedRadio<R> {
    pub fn new(radio: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Shared {
                radio,
                power_users: 0,
            })),
            powered: false,
        }
    }

    /// Another handle to the same radio, initially not holding power.
    pub fn handle(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            powered: false,
        }
    }

    /// Run `f` with exclusive access to the radio.
    pub fn with<T>(&self, f: impl FnOnce(&mut R) -> T) -> Result<T, RadioError> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard.radio))
    }

    /// Handles currently holding power.
    pub fn power_users(&self) -> u32 {
        self.lock().map_or(0, |g| g.power_users)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Shared<R>>, RadioError> {
        self.inner.lock().map_err(|_| RadioError::Busy)
    }
}

impl<R: RadioPort> RadioPort for SharedRadio<R> {
    fn power_on(&mut self) -> Result<(), RadioError> {
        if self.powered {
            return Ok(());
        }
        let mut g = self.lock()?;
        if g.power_users == 0 {
            g.radio.power_on()?;
        }
        g.power_users += 1;
        drop(g);
        self.powered = true;
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), RadioError> {
        if !self.powered {
            return Ok(());
        }
        self.powered = false;
        let mut g = self.lock()?;
        g.power_users = g.power_users.saturating_sub(1);
        if g.power_users == 0 {
            g.radio.power_off()
        } else {
            debug!("radio still in use by {} handle(s), leaving power on", g.power_users);
            Ok(())
        }
    }

    fn transmit(&mut self, frame: &[u8], timeout_ms: u32) -> Result<(), RadioError> {
        self.lock()?.radio.transmit(frame, timeout_ms)
    }

    fn receive(&mut self, timeout_ms: u32) -> Result<Option<Packet>, RadioError> {
        self.lock()?.radio.receive(timeout_ms)
    }
}

impl<R: RadioPort> Drop for SharedRadio<R> {
    fn drop(&mut self) {
        if self.powered {
            let _ = self.power_off();
        }
    }
}
