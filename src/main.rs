//! DoorSense Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single blocking event loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter       WifiAdapter     MqttSession             │
//! │  (DoorSensor+Power)    (Link)          (Session)               │
//! │  LogEventSink                                                  │
//! │  (EventSink)                                                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  lifecycle FSM · commands as data                      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Event queue ◀── WiFi task · MQTT task · wake from sleep       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::fmt::Display;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info};

use doorsense::adapters::device::DeviceAdapter;
use doorsense::adapters::device_id;
use doorsense::adapters::hardware::HardwareAdapter;
use doorsense::adapters::log_sink::LogEventSink;
use doorsense::adapters::mqtt::MqttSession;
use doorsense::adapters::wifi::WifiAdapter;
use doorsense::app::identity::DeviceIdentity;
use doorsense::app::service::AppService;
use doorsense::config::SystemConfig;
use doorsense::diagnostics::{self, BootInfo};
use doorsense::error::Error;
use doorsense::{events, pins};

/// Initialisation failed: stay powered and idle.  Only an external reset
/// (or the battery running out) gets the device out of here.
fn park(stage: &str, reason: &dyn Display) -> ! {
    error!("{} failed to initialize properly: {}, halting", stage, reason);
    loop {
        FreeRtos::delay_ms(60_000);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_sys::link_patches();
    esp_idf_logger::init()?;
    diagnostics::install_panic_handler();

    // ── 2. Latch power before anything slow ───────────────────
    let peripherals = Peripherals::take()?;
    let mut hold = PinDriver::output(peripherals.pins.gpio0)?;
    hold.set_high()?;
    info!("Hold rail GPIO{} latched high", pins::HOLD_GPIO);

    let mut detect = PinDriver::input(peripherals.pins.gpio2)?;
    detect.set_pull(Pull::Up)?;

    // ── 3. Identity + boot banner ─────────────────────────────
    let chip_id = device_id::chip_id(&device_id::read_mac());
    diagnostics::log_banner(&BootInfo::collect(chip_id));

    // ── 4. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    if let Err(e) = config.validate() {
        park("config", &Error::from(e));
    }
    let identity = DeviceIdentity::new(chip_id, &config);
    info!("Client ID: {} | topic: {}", identity.client_id, identity.topic);

    // ── 5. Construct adapters ─────────────────────────────────
    let mqtt = match MqttSession::open(&config, &identity) {
        Ok(session) => session,
        Err(e) => park("MQTT", &Error::from(e)),
    };

    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();
    let wifi = match WifiAdapter::new(peripherals.modem, sysloop, nvs, &config) {
        Ok(wifi) => wifi,
        Err(e) => park("WiFi", &Error::from(e)),
    };

    let hw = HardwareAdapter::new(detect, hold, pins::DETECT_GPIO);
    let mut device = DeviceAdapter::new(hw, wifi, mqtt);
    let mut log_sink = LogEventSink::new(&identity.topic);

    // ── 6. Construct app service ──────────────────────────────
    let mut app = AppService::new(config, identity);
    app.start(&mut device, &mut log_sink);

    info!("System ready. Entering event loop.");

    // ── 7. Event loop ─────────────────────────────────────────
    //
    // Blocks until a collaborator reports something; each event runs to
    // completion before the next is taken.  `CutPower` ends the process
    // from inside `handle_event` by removing the supply.
    loop {
        let event = events::wait_event();
        app.handle_event(event, &mut device, &mut log_sink);
    }
}
