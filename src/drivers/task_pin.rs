//! Core-pinned thread spawning for the ESP32-S3 dual core.
//!
//! ESP-IDF implements `std::thread` on pthreads, which are FreeRTOS tasks.
//! `esp_pthread_set_cfg()` sets the affinity, priority and stack of the
//! *next* thread created by the calling thread, so the config and spawn
//! pair must not interleave with other spawns on the same thread.
//!
//! On the host the core and priority are ignored.

use std::io;
use std::thread::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): radio scheduler.
    Pro = 0,
    /// Core 1 (APP_CPU): edge consumer and node tasks.
    App = 1,
}

/// Where and how a task runs.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    /// Must be NUL-terminated, e.g. `"radio\0"`.
    pub name: &'static str,
    pub core: Core,
    pub priority: u8,
    pub stack_kb: usize,
}

impl TaskSpec {
    fn display_name(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }
}

/// Spawn `f` as a FreeRTOS task per `spec`.
#[cfg(target_os = "espidf")]
pub fn spawn_pinned<T: Send + 'static>(
    spec: TaskSpec,
    f: impl FnOnce() -> T + Send + 'static,
) -> io::Result<JoinHandle<T>> {
    use esp_idf_svc::sys::{ESP_OK, esp_create_default_pthread_config, esp_pthread_set_cfg};

    // SAFETY: plain FFI; `spec.name` is a NUL-terminated 'static string.
    let ret = unsafe {
        let mut cfg = esp_create_default_pthread_config();
        cfg.pin_to_core = spec.core as i32;
        cfg.prio = i32::from(spec.priority);
        cfg.stack_size = (spec.stack_kb * 1024) as _;
        cfg.thread_name = spec.name.as_ptr().cast();
        esp_pthread_set_cfg(&cfg)
    };
    if ret != ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        spec.display_name(),
        spec.core,
        spec.priority,
        spec.stack_kb
    );
    std::thread::Builder::new()
        .name(spec.display_name().into())
        .spawn(f)
}

#[cfg(not(target_os = "espidf"))]
pub fn spawn_pinned<T: Send + 'static>(
    spec: TaskSpec,
    f: impl FnOnce() -> T + Send + 'static,
) -> io::Result<JoinHandle<T>> {
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        spec.display_name(),
        spec.stack_kb
    );
    std::thread::Builder::new()
        .name(spec.display_name().into())
        .stack_size(spec.stack_kb * 1024)
        .spawn(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawns_named_thread() {
        let spec = TaskSpec {
            name: "probe\0",
            core: Core::App,
            priority: 5,
            stack_kb: 64,
        };
        let handle = spawn_pinned(spec, || std::thread::current().name().map(String::from)).unwrap();
        assert_eq!(handle.join().unwrap().as_deref(), Some("probe"));
    }
}
