//! Integration tests: WiFi bring-up before the service starts.

use std::net::Ipv4Addr;

use pirwatch::app::connectivity::bring_up_network;
use pirwatch::app::events::AppEvent;
use pirwatch::config::RetryPolicy;
use pirwatch::error::{ConnectivityError, Error};

use super::mock_hw::*;

#[test]
fn waits_half_a_second_between_link_checks() {
    let cfg = config();
    let mut wifi = MockWifi { not_ready_for: 4, ..MockWifi::default() };
    let mut timer = FakeTimer::default();
    let mut sink = RecordingSink::default();

    let attempts = bring_up_network(
        &mut wifi,
        &cfg.wifi_ssid,
        &cfg.wifi_password,
        &cfg.wifi_retry,
        &mut timer,
        &mut sink,
    )
    .unwrap();

    assert_eq!(attempts, 5);
    assert_eq!(timer.sleeps_ms, vec![500; 4]);
    assert_eq!(wifi.ssid.as_deref(), Some("HomeWiFi"));
    match &sink.events[..] {
        [AppEvent::NetworkUp { ip, attempts: 5 }] => {
            assert_eq!(*ip, Some(Ipv4Addr::new(10, 0, 0, 42)));
        }
        other => panic!("unexpected events {other:?}"),
    }
}

#[test]
fn immediate_link_needs_no_sleep() {
    let mut wifi = MockWifi::default();
    let mut timer = FakeTimer::default();
    let mut sink = RecordingSink::default();

    let attempts = bring_up_network(
        &mut wifi,
        "HomeWiFi",
        "mysecret8",
        &RetryPolicy::fixed(500),
        &mut timer,
        &mut sink,
    )
    .unwrap();

    assert_eq!(attempts, 1);
    assert!(timer.sleeps_ms.is_empty());
}

#[test]
fn bad_credentials_fail_before_connecting() {
    let mut wifi = MockWifi::default();
    let mut timer = FakeTimer::default();
    let mut sink = RecordingSink::default();

    let r = bring_up_network(
        &mut wifi,
        "",
        "mysecret8",
        &RetryPolicy::fixed(500),
        &mut timer,
        &mut sink,
    );

    assert_eq!(r, Err(Error::Connectivity(ConnectivityError::InvalidSsid)));
    assert_eq!(wifi.connects, 0);
    assert!(sink.events.is_empty());
}

#[test]
fn bounded_bring_up_reports_not_ready() {
    let mut wifi = MockWifi { not_ready_for: u32::MAX, ..MockWifi::default() };
    let mut timer = FakeTimer::default();
    let mut sink = RecordingSink::default();

    let r = bring_up_network(
        &mut wifi,
        "HomeWiFi",
        "mysecret8",
        &RetryPolicy::fixed(500).with_max_attempts(3),
        &mut timer,
        &mut sink,
    );

    assert_eq!(r, Err(Error::Connectivity(ConnectivityError::NotReady)));
    assert_eq!(wifi.connects, 3);
    assert_eq!(timer.sleeps_ms, vec![500, 500]);
}
