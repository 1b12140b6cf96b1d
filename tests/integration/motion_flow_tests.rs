//! Integration tests: PIR samples → debounce → published events.

use pirwatch::app::events::{AppEvent, MotionStatus};
use pirwatch::error::{Error, SensorError};

use super::mock_hw::*;

#[test]
fn sustained_motion_publishes_detected_once() {
    let mut svc = service();
    let mut pir = ScriptedPir::holding(true);
    let mut timer = FakeTimer::default();
    let mut broker = MockBroker::online();
    let mut sink = RecordingSink::default();

    // Samples at t=0..=500 fall inside the boot dwell window; t=600 passes.
    run_cycles(&mut svc, &mut pir, &mut timer, &mut broker, &mut sink, 6);
    assert!(broker.published.is_empty());

    run_cycles(&mut svc, &mut pir, &mut timer, &mut broker, &mut sink, 20);
    assert_eq!(broker.published.len(), 1);
    let (topic, _) = &broker.published[0];
    assert_eq!(topic, TOPIC);

    let payload = &broker.payloads()[0];
    assert_eq!(payload["device_id"], DEVICE_ID);
    assert_eq!(payload["event_type"], "motion");
    assert_eq!(payload["status"], "DETECTED");
    assert_eq!(payload["timestamp_device"], "600");
    assert_eq!(svc.state().last_change_ms, 600);
}

#[test]
fn idle_sensor_never_publishes() {
    let mut svc = service();
    let mut pir = ScriptedPir::holding(false);
    let mut timer = FakeTimer::default();
    let mut broker = MockBroker::online();
    let mut sink = RecordingSink::default();

    run_cycles(&mut svc, &mut pir, &mut timer, &mut broker, &mut sink, 100);
    assert!(broker.published.is_empty());
    assert_eq!(pir.reads, 100);
    assert_eq!(broker.polls, 100, "client serviced every cycle");
}

#[test]
fn status_follows_direction_of_change() {
    let mut svc = service();
    let mut pir = ScriptedPir::holding(true);
    let mut timer = FakeTimer::at(10_000);
    let mut broker = MockBroker::online();
    let mut sink = RecordingSink::default();

    run_cycles(&mut svc, &mut pir, &mut timer, &mut broker, &mut sink, 3);
    pir.set(false);
    run_cycles(&mut svc, &mut pir, &mut timer, &mut broker, &mut sink, 10);
    pir.set(true);
    run_cycles(&mut svc, &mut pir, &mut timer, &mut broker, &mut sink, 10);

    assert_eq!(broker.statuses(), vec!["DETECTED", "NO_MOTION", "DETECTED"]);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::MotionPublished(_))),
        3
    );
}

#[test]
fn chatter_inside_dwell_is_suppressed() {
    let mut svc = service();
    let mut timer = FakeTimer::at(10_000);
    let mut broker = MockBroker::online();
    let mut sink = RecordingSink::default();

    // First HIGH is accepted, then the line chatters for 400 ms.
    let mut pir = ScriptedPir::levels(&[true, false, true, false, true]);
    pir.idle = true;
    run_cycles(&mut svc, &mut pir, &mut timer, &mut broker, &mut sink, 20);

    assert_eq!(broker.statuses(), vec!["DETECTED"]);
    assert!(svc.state().motion);
}

#[test]
fn short_pulse_after_dwell_is_reported_both_ways() {
    let mut svc = service();
    let mut timer = FakeTimer::at(10_000);
    let mut broker = MockBroker::online();
    let mut sink = RecordingSink::default();

    // HIGH accepted at 10_000; LOW sampled from 10_100 on is held back
    // until 10_600, the first sample whose dwell exceeds 500 ms.
    let mut pir = ScriptedPir::levels(&[true]);
    run_cycles(&mut svc, &mut pir, &mut timer, &mut broker, &mut sink, 10);

    let stamps: Vec<String> = broker
        .payloads()
        .iter()
        .map(|p| p["timestamp_device"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(stamps, vec!["10000", "10600"]);
    assert_eq!(broker.statuses(), vec!["DETECTED", "NO_MOTION"]);
}

#[test]
fn sensor_error_skips_cycle_without_state_change() {
    let mut svc = service();
    let mut timer = FakeTimer::at(10_000);
    let mut broker = MockBroker::online();
    let mut sink = RecordingSink::default();
    let mut pir = ScriptedPir::holding(true);
    pir.script.push_back(Err(SensorError::GpioReadFailed));

    let r = svc.poll(&mut pir, &mut timer, &mut broker, &mut sink);
    assert_eq!(r.unwrap_err(), Error::Sensor(SensorError::GpioReadFailed));
    assert!(!svc.state().motion);
    assert!(broker.published.is_empty());

    let r = svc.poll(&mut pir, &mut timer, &mut broker, &mut sink);
    assert_eq!(r.unwrap().map(|e| e.status), Some(MotionStatus::Detected));
}

#[test]
fn failed_publish_is_not_retried() {
    let mut svc = service();
    let mut timer = FakeTimer::at(10_000);
    let mut broker = MockBroker::online();
    broker.fail_publish = true;
    let mut sink = RecordingSink::default();
    let mut pir = ScriptedPir::holding(true);

    run_cycles(&mut svc, &mut pir, &mut timer, &mut broker, &mut sink, 10);

    assert!(broker.published.is_empty());
    assert!(svc.state().motion, "state advances even when the publish is lost");
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::PublishFailed { status: MotionStatus::Detected, .. })),
        1
    );
    assert_eq!(svc.published_count(), 0);
}

#[test]
fn started_event_names_device_and_topic() {
    let mut svc = service();
    let mut sink = RecordingSink::default();
    svc.start(&mut sink);
    match &sink.events[0] {
        AppEvent::Started { device_id, topic } => {
            assert_eq!(device_id, DEVICE_ID);
            assert_eq!(topic, TOPIC);
        }
        other => panic!("unexpected event {other:?}"),
    }
}
