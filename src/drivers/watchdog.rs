//! Task Watchdog Timer (TWDT) driver and the periodic reboot timer.
//!
//! The main task subscribes to the TWDT and feeds it from its supervision
//! loop; a stalled main task panics and resets the chip.  [`RebootTimer`]
//! decides when the scheduled field-reliability reboot is due.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

/// TWDT timeout for the main task.
pub const WATCHDOG_TIMEOUT_MS: u32 = 30_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(WATCHDOG_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Reconfigure the TWDT and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            // SAFETY: plain FFI calls with a valid config; null = current task.
            let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
            if ret != ESP_OK as i32 {
                warn!("TWDT reconfigure returned {ret} (may already be configured)");
            }
            let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
            let subscribed = ret == ESP_OK as i32;
            if subscribed {
                info!("Watchdog: subscribed ({timeout_ms} ms, panic on trigger)");
            } else {
                warn!("Watchdog: failed to subscribe ({ret})");
            }
            Self { subscribed }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): {timeout_ms} ms, no-op");
            Self {}
        }
    }

    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: the calling task subscribed in `new`.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}

/// Tracks when the periodic reboot is due.
#[derive(Debug, Clone, Copy)]
pub struct RebootTimer {
    /// `None` disables the reboot.
    interval_ms: Option<u64>,
    started_ms: u64,
}

impl RebootTimer {
    /// Reboot every `hours`, counted from `now_ms`.  Zero disables it.
    pub fn new(hours: u32, now_ms: u64) -> Self {
        let interval_ms = (hours > 0).then(|| u64::from(hours) * 3_600_000);
        Self {
            interval_ms,
            started_ms: now_ms,
        }
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.interval_ms
            .is_some_and(|interval| now_ms.saturating_sub(self.started_ms) >= interval)
    }

    pub fn interval_ms(&self) -> Option<u64> {
        self.interval_ms
    }
}
