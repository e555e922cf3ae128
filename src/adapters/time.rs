//! Monotonic clock for the scheduler, the heartbeat and the reboot timer.
//!
//! On the device the clock reads the ESP-IDF high-resolution timer, which
//! counts from boot.  On the host it counts from construction, so tests see
//! small numbers.  Sleeping is `std::thread::sleep` everywhere; under
//! ESP-IDF that is a `vTaskDelay` and the calling task yields.

use std::time::Duration;

use crate::app::ports::TimePort;

#[derive(Clone, Copy)]
pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    epoch: std::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            epoch: std::time::Instant::now(),
        }
    }

    #[cfg(target_os = "espidf")]
    fn micros(&self) -> u64 {
        // SAFETY: reads a hardware counter, no preconditions.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    #[cfg(not(target_os = "espidf"))]
    fn micros(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    pub fn uptime_secs(&self) -> u64 {
        self.micros() / 1_000_000
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimePort for SystemClock {
    fn now_ms(&self) -> u64 {
        self.micros() / 1000
    }

    fn sleep_ms(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}
