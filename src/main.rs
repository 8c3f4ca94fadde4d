//! Light firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  build_actuator    LogEventSink   NvsAdapter   TimeAdapter     │
//! │  (ActuatorPort)    (EventSink)    (ConfigPort) (Instant)       │
//! │  WifiAdapter       CloudAdapter ◀──channels──▶ CloudBridge     │
//! │  (Connectivity)    (CloudPort)                 (cloud thread)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           LightController (pure logic)                 │    │
//! │  │  FSM · ParameterStore · TimeoutScheduler               │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Runtime::step: motion queue · cloud inbox · timer · keep-alive│
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration as StdDuration;

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use lighting_system::adapters::cloud::{CloudAdapter, CloudLink};
use lighting_system::adapters::cloud_task::CloudBridge;
use lighting_system::adapters::hardware::build_actuator;
use lighting_system::adapters::log_sink::LogEventSink;
use lighting_system::adapters::nvs::NvsAdapter;
use lighting_system::adapters::time::TimeAdapter;
use lighting_system::adapters::wifi::{ConnectivityPort, WifiAdapter};
use lighting_system::app::ports::ConfigPort;
use lighting_system::config::SystemConfig;
use lighting_system::drivers::{hw_init, watchdog::Watchdog};
use lighting_system::error::Error;
use lighting_system::events;
use lighting_system::runtime::Runtime;

const CLOUD_TASK_STACK: usize = 8 * 1024;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Light system v{}                 ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new().map_err(Error::from)?;
    let config = match nvs.load().and_then(|cfg| cfg.validate().map(|()| cfg)) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Stored config unusable ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Peripherals; the light is driven dark by Runtime::start ──
    hw_init::init_peripherals(config.pwm_frequency_hz).map_err(Error::from)?;
    let mut watchdog = Watchdog::default();
    let actuator = build_actuator(&config);

    // ── 4. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let driver = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs_partition))?,
        sysloop,
    )?;
    let mut wifi = WifiAdapter::with_driver(driver);
    wifi.set_credentials(&config.wifi_ssid, &config.wifi_password)
        .map_err(Error::from)?;
    wifi.connect().map_err(Error::from)?;

    // ── 5. Cloud resources + controller ───────────────────────
    let time = TimeAdapter::new();
    let cloud = CloudAdapter::global(&config.endpoint_name);
    let mut runtime = Runtime::new(&config, actuator, LogEventSink::new(), cloud);
    runtime.start(time.now())?;
    let document = runtime
        .cloud()
        .registration_document()
        .map_err(|e| anyhow::anyhow!("registration document: {}", e))?;
    info!("Registration: {}", document);

    let bridge = CloudBridge::new(CloudLink::global(), document);
    let server = config.cloud_server.clone();
    std::thread::Builder::new()
        .name("cloud-io".into())
        .stack_size(CLOUD_TASK_STACK)
        .spawn(move || bridge.run(&server))?;

    // ── 6. Motion interrupts, only once the light is dark ─────
    hw_init::init_isr_service().map_err(Error::from)?;

    let events = events::main_loop_consumer()
        .ok_or_else(|| anyhow::anyhow!("event queue already claimed"))?;

    info!("System ready. Entering event loop.");

    // ── 7. Event loop ─────────────────────────────────────────
    let loop_interval = StdDuration::from_millis(u64::from(config.loop_interval_ms));
    let mut last_wifi_poll = time.uptime_us();

    loop {
        runtime.step(&events, time.now());

        let elapsed_secs = (time.uptime_us() - last_wifi_poll) / 1_000_000;
        if elapsed_secs > 0 {
            wifi.poll(elapsed_secs as u32);
            last_wifi_poll += elapsed_secs * 1_000_000;
        }

        watchdog.feed();
        std::thread::sleep(loop_interval);
    }
}
