//! PirLink node firmware: main entry point.
//!
//! ```text
//!   PIR A ─ISR─┐                                   ┌──▶ LogEventSink (serial log)
//!   PIR B ─ISR─┴─▶ EdgeChannel ─▶ node tasks ──────┤
//!                  (50 edges)     classifier,      └──▶ TelemetrySink ─▶ OutboundQueue
//!                                 commands,                                  │
//!                                 heartbeat ◀── InboundQueue ◀──┐            ▼
//!                                                               └── RadioScheduler ──▶ SharedRadio
//!                                                                   (every tick)        ▶ PoweredRadio
//!                                                                                       ▶ LoraModem (UART)
//! ```
//!
//! The main task wires everything, then supervises: it feeds the task
//! watchdog and performs the periodic reboot.

use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use pirlink::adapters::log_sink::LogEventSink;
use pirlink::adapters::lora_modem::LoraModem;
use pirlink::adapters::telemetry_sink::{TelemetrySink, render};
use pirlink::adapters::time::SystemClock;
use pirlink::app::events::AppEvent;
use pirlink::app::ports::TimePort;
use pirlink::app::service::NodeService;
use pirlink::app::tasks::run_node_tasks;
use pirlink::config::{NodeConfig, RadioScheduleConfig};
use pirlink::drivers::hw_init::{self, SysOutputPin};
use pirlink::drivers::status_led::{BOOT_BLINKS, RunLight, TX_BLINKS};
use pirlink::drivers::task_pin::{Core, TaskSpec, spawn_pinned};
use pirlink::drivers::watchdog::{RebootTimer, Watchdog};
use pirlink::events::EdgeChannel;
use pirlink::pins;
use pirlink::queue::{InboundQueue, OutboundQueue};
use pirlink::radio::{PoweredRadio, SharedRadio, transmit_once};
use pirlink::scheduler::RadioScheduler;
use pirlink::sensors::{PirSensor, Side};

// ── Cross-task state ──────────────────────────────────────────

static EDGES: EdgeChannel = EdgeChannel::new();
static OUTBOUND: OutboundQueue = OutboundQueue::new();
static INBOUND: InboundQueue = InboundQueue::new();

const NODE_TASKS: TaskSpec = TaskSpec {
    name: "node\0",
    core: Core::App,
    priority: 10,
    stack_kb: 16,
};

const RADIO_TASK: TaskSpec = TaskSpec {
    name: "radio\0",
    core: Core::Pro,
    priority: 5,
    stack_kb: 16,
};

/// Supervision loop period.
const SUPERVISE_MS: u32 = 1000;

type Radio = PoweredRadio<LoraModem<UartDriver<'static>>, SysOutputPin>;

fn delay_ms(ms: u32) {
    std::thread::sleep(Duration::from_millis(u64::from(ms)));
}

/// Defaults, optionally overridden by JSON baked in at build time.
fn load_config() -> NodeConfig {
    let Some(json) = option_env!("PIRLINK_CONFIG") else {
        info!("Config: defaults");
        return NodeConfig::default();
    };
    match parse_override(json) {
        Ok(config) => {
            info!("Config: build-time override applied");
            config
        }
        Err(e) => {
            warn!("Config override rejected ({e}), using defaults");
            NodeConfig::default()
        }
    }
}

fn parse_override(json: &str) -> pirlink::error::Result<NodeConfig> {
    Ok(NodeConfig::from_json(json)?)
}

/// Body of the radio task.
fn run_radio(
    radio: SharedRadio<Radio>,
    clock: SystemClock,
    config: RadioScheduleConfig,
    mut run_light: RunLight<SysOutputPin>,
) {
    let mut scheduler = RadioScheduler::new(radio, clock, config, &OUTBOUND, &INBOUND);
    let mut reported = (0, 0);
    scheduler.run(|report| {
        if report.transmitted {
            let Ok(()) = run_light.blink(TX_BLINKS);
        }
        let drops = (OUTBOUND.dropped(), EDGES.dropped());
        if drops != reported || report.inbound_dropped > 0 {
            warn!(
                "drops: outbound={} edges={} inbound={}",
                drops.0,
                drops.1,
                INBOUND.dropped()
            );
            reported = drops;
        }
    })
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PirLink node v{:<22}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config();
    OUTBOUND.set_capacity(config.outbound_queue_capacity);
    INBOUND.set_capacity(config.inbound_queue_capacity);
    info!(
        "Node '{}': tick {}s, window {}s, mode {:?}",
        config.node_id,
        config.radio.tick_interval_secs,
        config.radio.receive_window_secs,
        config.radio.mode
    );

    // ── 3. Outputs, watchdog, run light ───────────────────────
    hw_init::init_outputs()?;
    let watchdog = Watchdog::default();
    let clock = SystemClock::new();
    let reboot = RebootTimer::new(config.reboot_interval_hours, clock.now_ms());

    let mut run_light = RunLight::new(
        SysOutputPin::new(pins::RUN_LED_GPIO),
        pins::RUN_LED_ACTIVE_LOW,
        delay_ms,
    )?;
    run_light.blink(BOOT_BLINKS)?;

    // ── 4. Radio stack ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    // SAFETY: the UART pins are used by nothing else.
    let (tx, rx) = unsafe {
        (
            AnyIOPin::new(pins::LORA_UART_TX_GPIO),
            AnyIOPin::new(pins::LORA_UART_RX_GPIO),
        )
    };
    let uart = UartDriver::new(
        peripherals.uart1,
        tx,
        rx,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(pins::LORA_UART_BAUD)),
    )?;
    let modem = LoraModem::new(uart, config.lora.clone());
    let powered = PoweredRadio::new(modem, SysOutputPin::new(pins::RADIO_ENABLE_GPIO))
        .with_settle(pins::RADIO_SETTLE_MS, delay_ms);
    let radio = SharedRadio::new(powered);

    // ── 5. Boot announcement (also detects the modem) ─────────
    let online = render(&config.node_id, &AppEvent::Started);
    let timeout = config.radio.effective_transmit_timeout_ms();
    match transmit_once(&mut radio.handle(), online.as_bytes(), timeout) {
        Ok(()) => info!("Announced {online}"),
        Err(e) if e.is_fatal() => {
            error!("LoRa modem: {e}, restarting");
            delay_ms(SUPERVISE_MS);
            hw_init::restart();
        }
        Err(e) => warn!("Boot announcement failed: {}", pirlink::error::Error::from(e)),
    }

    // ── 6. PIR interrupts ─────────────────────────────────────
    hw_init::init_pir_inputs([
        PirSensor::new(Side::Arrive, pins::PIR_ARRIVE_GPIO, &EDGES),
        PirSensor::new(Side::Depart, pins::PIR_DEPART_GPIO, &EDGES),
    ])?;

    // ── 7. Node tasks ─────────────────────────────────────────
    let service = NodeService::new()?;
    let node_id = config.node_id.clone();
    let heartbeat = Duration::from_secs(u64::from(config.heartbeat_interval_secs));
    spawn_pinned(NODE_TASKS, move || {
        let sink = (
            LogEventSink::new(),
            TelemetrySink::new(&node_id, &OUTBOUND).without_start_announcement(),
        );
        run_node_tasks(service, sink, &EDGES, &INBOUND, &clock, heartbeat);
    })?;

    // ── 8. Radio scheduler ────────────────────────────────────
    let scheduler_radio = radio.handle();
    let radio_config = config.radio.clone();
    spawn_pinned(RADIO_TASK, move || {
        run_radio(scheduler_radio, clock, radio_config, run_light);
    })?;

    // ── 9. Supervise ──────────────────────────────────────────
    info!("System ready");
    loop {
        watchdog.feed();
        if reboot.is_due(clock.now_ms()) {
            info!(
                "Scheduled reboot after {}h",
                config.reboot_interval_hours
            );
            delay_ms(SUPERVISE_MS);
            hw_init::restart();
        }
        delay_ms(SUPERVISE_MS);
    }
}
