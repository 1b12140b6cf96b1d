//! pirwatch Firmware — Main Entry Point
//!
//! Hexagonal layout with a single cooperative polling loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   Esp32TimeAdapter             │
//! │  (MotionInput)     (EventSink)    (Clock + DelayNs)            │
//! │  WifiAdapter       MqttAdapter                                 │
//! │  (Connectivity)    (Broker)                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              MotionService (pure logic)                │    │
//! │  │  debounce · publish · reconnect-on-demand              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use embedded_hal::delay::DelayNs;
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::gpio::{AnyInputPin, Pin, PinDriver, Pull};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use pirwatch::adapters::device_id;
use pirwatch::adapters::hardware::HardwareAdapter;
use pirwatch::adapters::log_sink::LogEventSink;
use pirwatch::adapters::mqtt::{MqttAdapter, MqttSettings};
use pirwatch::adapters::time::Esp32TimeAdapter;
use pirwatch::adapters::wifi::WifiAdapter;
use pirwatch::app::connectivity::bring_up_network;
use pirwatch::app::service::MotionService;
use pirwatch::config::DeviceConfig;
use pirwatch::sensors::pir::PirSensor;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  pirwatch v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Build-time config + identity ───────────────────────
    let mut config = DeviceConfig::default();
    device_id::resolve(&mut config, &device_id::read_mac());
    config.validate()?;
    info!("Broker {} | topic {}", config.broker_url(), config.topic());

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // PIR output on GPIO2 (pins::PIR_GPIO), idle-high pull-up.
    let pir_pin: AnyInputPin = peripherals.pins.gpio2.into();
    if pir_pin.pin() != config.pir_gpio {
        warn!(
            "PIR wired to GPIO{} but config names GPIO{}",
            pir_pin.pin(),
            config.pir_gpio
        );
    }
    let mut pir_driver = PinDriver::input(pir_pin)?;
    pir_driver.set_pull(Pull::Up)?;
    let mut pir = HardwareAdapter::new(PirSensor::new(pir_driver, config.pir_gpio));

    let mut timer = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();

    // ── 4. WiFi bring-up (blocks until the link is up) ────────
    let driver = EspWifi::new(peripherals.modem, sysloop, Some(nvs))?;
    let mut wifi = WifiAdapter::new().with_driver(driver);
    bring_up_network(
        &mut wifi,
        &config.wifi_ssid,
        &config.wifi_password,
        &config.wifi_retry,
        &mut timer,
        &mut sink,
    )?;

    // ── 5. Broker + service ───────────────────────────────────
    let mut broker = MqttAdapter::new(MqttSettings::from_config(&config));
    let mut service = MotionService::new(&config)?;
    service.start(&mut sink);

    info!("System ready. Entering polling loop.");

    // ── 6. Polling loop ───────────────────────────────────────
    loop {
        if let Err(e) = service.poll(&mut pir, &mut timer, &mut broker, &mut sink) {
            warn!("poll: {}", e);
        }
        timer.delay_ms(config.poll_interval_ms);
    }
}
