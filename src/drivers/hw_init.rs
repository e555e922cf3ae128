//! One-shot GPIO initialisation and the PIR interrupt wiring.
//!
//! Uses raw ESP-IDF sys calls.  Called once from `main()` before any task
//! starts.  Host builds log and return `Ok` so the wiring code paths stay
//! compiled.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use log::info;

#[cfg(any(target_os = "espidf", test))]
use crate::pins;
use crate::sensors::PirSensor;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrAddFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={rc})"),
            Self::IsrAddFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={rc})"),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── GPIO outputs ──────────────────────────────────────────────

/// Configure the radio enable and run-light pins as outputs, both off.
#[cfg(target_os = "espidf")]
pub fn init_outputs() -> Result<(), HwInitError> {
    let idle_levels = [
        (pins::RADIO_ENABLE_GPIO, 0),
        (pins::RUN_LED_GPIO, u32::from(pins::RUN_LED_ACTIVE_LOW)),
    ];
    for (pin, level) in idle_levels {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: single-threaded boot path; pin numbers come from `pins`.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        unsafe { gpio_set_level(pin, level) };
    }
    info!("hw_init: outputs configured (radio enable, run light)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_outputs() -> Result<(), HwInitError> {
    info!("hw_init(sim): outputs skipped");
    Ok(())
}

/// A configured GPIO output driven through `gpio_set_level`.
///
/// Implements `embedded_hal::digital::OutputPin` so the radio power gate and
/// the run light stay hardware-agnostic.
#[derive(Debug)]
pub struct SysOutputPin {
    gpio: i32,
    high: bool,
}

impl SysOutputPin {
    /// Wrap `gpio`, which must already be configured as an output.
    pub fn new(gpio: i32) -> Self {
        Self { gpio, high: false }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Last level written.
    pub fn is_high(&self) -> bool {
        self.high
    }

    fn write(&mut self, high: bool) {
        #[cfg(target_os = "espidf")]
        // SAFETY: register write on a pin configured by `init_outputs`.
        unsafe {
            gpio_set_level(self.gpio, u32::from(high));
        }
        self.high = high;
    }
}

impl ErrorType for SysOutputPin {
    type Error = Infallible;
}

impl OutputPin for SysOutputPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.write(true);
        Ok(())
    }
}

// ── PIR interrupts ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn pir_gpio_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the leaked `&'static PirSensor` registered below.
    let sensor = unsafe { &*(arg as *const PirSensor) };
    // SAFETY: register read; safe in ISR context.
    let high = unsafe { gpio_get_level(sensor.gpio()) } != 0;
    sensor.on_level(high);
}

/// Configure both PIR pins as pulled-down any-edge inputs and attach the
/// edge ISR.  Each sensor is leaked so the ISR argument stays valid for the
/// life of the program.
#[cfg(target_os = "espidf")]
pub fn init_pir_inputs(sensors: [PirSensor; 2]) -> Result<(), HwInitError> {
    // SAFETY: boot path, before any task runs.  ESP_ERR_INVALID_STATE means
    // the ISR service is already installed.
    let ret = unsafe { gpio_install_isr_service(0) };
    if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
        return Err(HwInitError::IsrInstallFailed(ret));
    }

    for sensor in sensors {
        let sensor: &'static PirSensor = Box::leak(Box::new(sensor));
        let pin = sensor.gpio();
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
        };
        unsafe {
            let ret = gpio_config(&cfg);
            if ret != ESP_OK as i32 {
                return Err(HwInitError::GpioConfigFailed(ret));
            }
            let arg = core::ptr::from_ref(sensor).cast_mut().cast();
            let ret = gpio_isr_handler_add(pin, Some(pir_gpio_isr), arg);
            if ret != ESP_OK as i32 {
                return Err(HwInitError::IsrAddFailed(ret));
            }
            gpio_intr_enable(pin);
        }
        info!("hw_init: PIR {:?} on GPIO{pin}", sensor.side());
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_pir_inputs(sensors: [PirSensor; 2]) -> Result<(), HwInitError> {
    for sensor in &sensors {
        info!("hw_init(sim): PIR {:?} on GPIO{} not wired", sensor.side(), sensor.gpio());
    }
    Ok(())
}

/// Reboot the chip.
#[cfg(target_os = "espidf")]
pub fn restart() -> ! {
    // SAFETY: esp_restart never returns.
    unsafe { esp_restart() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_pin_tracks_level() {
        let mut pin = SysOutputPin::new(pins::RADIO_ENABLE_GPIO);
        assert!(!pin.is_high());
        pin.set_high().unwrap();
        assert!(pin.is_high());
        pin.set_low().unwrap();
        assert!(!pin.is_high());
    }

    #[test]
    fn host_wiring_is_a_no_op() {
        static EDGES: crate::events::EdgeChannel = crate::events::EdgeChannel::new();
        let sensors = [
            PirSensor::new(crate::sensors::Side::Arrive, pins::PIR_ARRIVE_GPIO, &EDGES),
            PirSensor::new(crate::sensors::Side::Depart, pins::PIR_DEPART_GPIO, &EDGES),
        ];
        assert!(init_outputs().is_ok());
        assert!(init_pir_inputs(sensors).is_ok());
        assert!(EDGES.is_empty());
    }
}
