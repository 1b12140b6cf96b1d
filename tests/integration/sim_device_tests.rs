//! Integration tests: the real adapters in host simulation.
//!
//! Same wiring as `main`, with the PIR pin replaced by a shared level and
//! the WiFi / MQTT adapters running their in-memory backends.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin};
use pirwatch::adapters::device_id;
use pirwatch::adapters::hardware::HardwareAdapter;
use pirwatch::adapters::log_sink::LogEventSink;
use pirwatch::adapters::mqtt::{MqttAdapter, MqttSettings};
use pirwatch::adapters::wifi::{WifiAdapter, WifiState};
use pirwatch::app::connectivity::bring_up_network;
use pirwatch::app::events::AppEvent;
use pirwatch::app::ports::ConnectivityPort;
use pirwatch::app::service::MotionService;
use pirwatch::config::DeviceConfig;
use pirwatch::sensors::pir::PirSensor;

use super::mock_hw::*;

/// Input pin whose level the test flips from outside.
#[derive(Clone, Default)]
struct SharedPin(Rc<Cell<bool>>);

impl ErrorType for SharedPin {
    type Error = Infallible;
}

impl InputPin for SharedPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

fn board_config() -> DeviceConfig {
    let mut cfg = DeviceConfig {
        wifi_ssid: "HomeWiFi".into(),
        wifi_password: "mysecret8".into(),
        device_id: String::new(),
        ..DeviceConfig::default()
    };
    device_id::resolve(&mut cfg, &device_id::read_mac());
    cfg
}

#[test]
fn boot_to_first_publish() {
    let cfg = board_config();
    cfg.validate().unwrap();
    assert_eq!(cfg.topic(), "sensors/ESP32_PIR_EFCAFE/events");

    let level = SharedPin::default();
    let mut pir = HardwareAdapter::new(PirSensor::new(level.clone(), cfg.pir_gpio));
    let mut timer = FakeTimer::default();
    let mut sink = RecordingSink::default();

    let mut wifi = WifiAdapter::new();
    wifi.sim_set_link_delay(3);
    let attempts = bring_up_network(
        &mut wifi,
        &cfg.wifi_ssid,
        &cfg.wifi_password,
        &cfg.wifi_retry,
        &mut timer,
        &mut sink,
    )
    .unwrap();
    assert_eq!(attempts, 4);
    assert_eq!(wifi.state(), WifiState::Connected);
    assert!(wifi.local_ip().is_some());

    let mut broker = MqttAdapter::new(MqttSettings::from_config(&cfg));
    broker.sim().refuse_connects = 2;

    let mut svc = MotionService::new(&cfg).unwrap();
    svc.start(&mut sink);

    level.0.set(true);
    for _ in 0..5 {
        let _ = svc.poll(&mut pir, &mut timer, &mut broker, &mut sink);
        timer.delay_ms(cfg.poll_interval_ms);
    }

    assert_eq!(broker.attempts(), 3);
    let published = &broker.sim().published;
    assert_eq!(published.len(), 1);
    let (topic, payload) = &published[0];
    assert_eq!(topic, "sensors/ESP32_PIR_EFCAFE/events");
    let json: serde_json::Value = serde_json::from_str(payload).unwrap();
    assert_eq!(json["device_id"], "ESP32_PIR_EFCAFE");
    assert_eq!(json["status"], "DETECTED");
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::BrokerConnected { attempts: 3 })),
        1
    );
}

#[test]
fn raw_chatter_reaches_adapter_but_not_broker() {
    let cfg = board_config();
    let level = SharedPin::default();
    let mut pir = HardwareAdapter::new(PirSensor::new(level.clone(), cfg.pir_gpio));
    let mut timer = FakeTimer::at(60_000);
    let mut broker = MqttAdapter::new(MqttSettings::from_config(&cfg));
    let mut sink = LogEventSink::new();
    let mut svc = MotionService::new(&cfg).unwrap();

    for i in 0..6 {
        level.0.set(i % 2 == 0);
        svc.poll(&mut pir, &mut timer, &mut broker, &mut sink).unwrap();
        timer.delay_ms(cfg.poll_interval_ms);
    }

    assert_eq!(pir.pir().raw_edges(), 5);
    assert_eq!(broker.sim().published.len(), 1);
    assert_eq!(broker.sim().polls, 6);
}

#[test]
fn lost_publish_is_dropped() {
    let cfg = board_config();
    let level = SharedPin::default();
    let mut pir = HardwareAdapter::new(PirSensor::new(level.clone(), cfg.pir_gpio));
    let mut timer = FakeTimer::at(60_000);
    let mut broker = MqttAdapter::new(MqttSettings::from_config(&cfg));
    let mut sink = RecordingSink::default();
    let mut svc = MotionService::new(&cfg).unwrap();

    broker.sim().fail_publishes = true;
    level.0.set(true);
    svc.poll(&mut pir, &mut timer, &mut broker, &mut sink).unwrap();

    broker.sim().fail_publishes = false;
    for _ in 0..10 {
        svc.poll(&mut pir, &mut timer, &mut broker, &mut sink).unwrap();
        timer.delay_ms(cfg.poll_interval_ms);
    }

    assert!(broker.sim().published.is_empty());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::PublishFailed { .. })), 1);
}
