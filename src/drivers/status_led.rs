//! Run light: a single LED blinked to show the node is alive.
//!
//! Five blinks at boot, two after every transmitted frame.  Each blink is
//! 200 ms on then 200 ms off, and the LED always ends dark.
//!
//! Generic over `embedded_hal::digital::OutputPin`; the delay is injected so
//! host tests run instantly.

use embedded_hal::digital::OutputPin;

pub const BOOT_BLINKS: u32 = 5;
pub const TX_BLINKS: u32 = 2;
pub const BLINK_MS: u32 = 200;

pub struct RunLight<P> {
    pin: P,
    active_low: bool,
    delay: fn(u32),
}

impl<P: OutputPin> RunLight<P> {
    /// Wrap `pin` and switch the LED off.
    pub fn new(pin: P, active_low: bool, delay: fn(u32)) -> Result<Self, P::Error> {
        let mut light = Self {
            pin,
            active_low,
            delay,
        };
        light.set(false)?;
        Ok(light)
    }

    pub fn set(&mut self, lit: bool) -> Result<(), P::Error> {
        if lit != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }

    /// Blink `count` times.
    pub fn blink(&mut self, count: u32) -> Result<(), P::Error> {
        for _ in 0..count {
            self.set(true)?;
            (self.delay)(BLINK_MS);
            self.set(false)?;
            (self.delay)(BLINK_MS);
        }
        Ok(())
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}
