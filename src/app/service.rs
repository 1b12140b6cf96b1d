//! Motion service, the hexagonal core.
//!
//! [`MotionService`] owns the debounced PIR state and the publish target.
//! All I/O flows through port traits injected at call sites, making the
//! whole polling step testable with mock adapters.
//!
//! ```text
//!  MotionInputPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!  ClockPort + Delay ─▶│     MotionService      │
//!                      │  debounce · publish    │──▶ BrokerPort
//!                      └────────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::{ConfigError, DeviceConfig, RetryPolicy};
use crate::error::Result;

use super::connectivity::ensure_broker;
use super::events::{AppEvent, MotionEvent, MotionStatus};
use super::ports::{BrokerPort, ClockPort, EventSink, MotionInputPort};

// ───────────────────────────────────────────────────────────────
// Debounce state
// ───────────────────────────────────────────────────────────────

/// Last accepted PIR state and when it was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionState {
    pub motion: bool,
    /// Uptime (ms) of the last accepted transition.  Starts at boot (0).
    pub last_change_ms: u32,
}

impl MotionState {
    pub fn status(&self) -> MotionStatus {
        MotionStatus::from_level(self.motion)
    }
}

// ───────────────────────────────────────────────────────────────
// MotionService
// ───────────────────────────────────────────────────────────────

pub struct MotionService {
    state: MotionState,
    device_id: String,
    topic: String,
    debounce_ms: u32,
    broker_retry: RetryPolicy,
    published: u32,
}

impl MotionService {
    /// Construct the service from a resolved configuration.
    ///
    /// The device id must already be set (see
    /// [`device_id::resolve`](crate::adapters::device_id::resolve)).
    pub fn new(config: &DeviceConfig) -> core::result::Result<Self, ConfigError> {
        crate::config::validate_device_id(&config.device_id)?;
        Ok(Self {
            state: MotionState::default(),
            device_id: config.device_id.clone(),
            topic: config.topic(),
            debounce_ms: config.debounce_ms,
            broker_retry: config.broker_retry,
            published: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        info!(
            "MotionService started: device '{}' → topic '{}' (debounce {} ms)",
            self.device_id, self.topic, self.debounce_ms
        );
        sink.emit(&AppEvent::Started {
            device_id: self.device_id.clone(),
            topic: self.topic.clone(),
        });
    }

    // ── Debounce ──────────────────────────────────────────────

    /// Feed one PIR sample taken at `now_ms`.
    ///
    /// Accepts the sample as a transition only if it differs from the
    /// recorded state and strictly more than `debounce_ms` have passed since
    /// the last accepted transition.  Returns the new status when accepted.
    pub fn sample(&mut self, motion: bool, now_ms: u32) -> Option<MotionStatus> {
        if motion == self.state.motion {
            return None;
        }
        let dwell_ms = now_ms.wrapping_sub(self.state.last_change_ms);
        if dwell_ms <= self.debounce_ms {
            debug!("PIR: {} suppressed (dwell {} ms)", MotionStatus::from_level(motion), dwell_ms);
            return None;
        }
        self.state = MotionState { motion, last_change_ms: now_ms };
        Some(MotionStatus::from_level(motion))
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one polling cycle: reconnect if needed → sample → publish on
    /// a debounced transition.
    ///
    /// `timer` provides both the uptime and the blocking delay used by
    /// reconnect, keeping a single owner for the platform timer.
    pub fn poll(
        &mut self,
        pir: &mut impl MotionInputPort,
        timer: &mut (impl ClockPort + DelayNs),
        broker: &mut impl BrokerPort,
        sink: &mut impl EventSink,
    ) -> Result<Option<MotionEvent>> {
        ensure_broker(broker, &self.broker_retry, timer, sink)?;
        broker.poll();

        let motion = pir.read_motion()?;
        let now_ms = timer.now_ms();

        match self.sample(motion, now_ms) {
            Some(status) => self.publish(status, now_ms, timer, broker, sink).map(Some),
            None => Ok(None),
        }
    }

    /// Publish one motion event at-most-once.
    ///
    /// A broker-side failure is reported through the sink and not retried;
    /// the recorded state has already moved on.
    pub fn publish(
        &mut self,
        status: MotionStatus,
        timestamp_ms: u32,
        delay: &mut impl DelayNs,
        broker: &mut impl BrokerPort,
        sink: &mut impl EventSink,
    ) -> Result<MotionEvent> {
        let event = MotionEvent::new(&self.device_id, status, timestamp_ms);
        let payload = event.to_json()?;

        ensure_broker(broker, &self.broker_retry, delay, sink)?;

        match broker.publish(&self.topic, payload.as_bytes()) {
            Ok(()) => {
                self.published = self.published.wrapping_add(1);
                sink.emit(&AppEvent::MotionPublished(event.clone()));
            }
            Err(e) => {
                warn!("MQTT: publish of {} failed ({}), dropping", status, e);
                sink.emit(&AppEvent::PublishFailed { status, error: e });
            }
        }
        Ok(event)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Number of events handed to the broker since boot.
    pub fn published_count(&self) -> u32 {
        self.published
    }
}
