//! Outbound application events and the published motion payload.
//!
//! The [`MotionService`](super::service::MotionService) emits [`AppEvent`]s
//! through the [`EventSink`](super::ports::EventSink) port and publishes
//! [`MotionEvent`]s to the broker as JSON.

use core::fmt;
use core::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::error::{BrokerError, PayloadError};

/// Publish buffer size on the device; encoded payloads must be shorter.
pub const MAX_PAYLOAD_LEN: usize = 200;

/// Debounced PIR state as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionStatus {
    #[serde(rename = "DETECTED")]
    Detected,
    #[serde(rename = "NO_MOTION")]
    NoMotion,
}

impl MotionStatus {
    pub fn from_level(motion: bool) -> Self {
        if motion { Self::Detected } else { Self::NoMotion }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detected => "DETECTED",
            Self::NoMotion => "NO_MOTION",
        }
    }
}

impl fmt::Display for MotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Motion,
}

/// JSON body published on every debounced transition.
///
/// ```json
/// {"device_id":"ESP32_PIR_001","event_type":"motion","status":"DETECTED","timestamp_device":"1234"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionEvent {
    pub device_id: String,
    pub event_type: EventType,
    pub status: MotionStatus,
    /// Device uptime in ms, carried as a decimal string.
    #[serde(with = "millis_string")]
    pub timestamp_device: u32,
}

impl MotionEvent {
    pub fn new(device_id: &str, status: MotionStatus, timestamp_ms: u32) -> Self {
        Self {
            device_id: device_id.into(),
            event_type: EventType::Motion,
            status,
            timestamp_device: timestamp_ms,
        }
    }

    /// Encode to the wire format, enforcing the publish buffer limit.
    pub fn to_json(&self) -> Result<String, PayloadError> {
        let json = serde_json::to_string(self).map_err(|_| PayloadError::Encode)?;
        if json.len() >= MAX_PAYLOAD_LEN {
            return Err(PayloadError::TooLarge { len: json.len() });
        }
        Ok(json)
    }
}

mod millis_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(ms: &u32, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let raw = <&str>::deserialize(d)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service is ready and about to enter the polling loop.
    Started { device_id: String, topic: String },

    /// WiFi link is up.
    NetworkUp { ip: Option<Ipv4Addr>, attempts: u32 },

    /// A broker session was (re)established.
    BrokerConnected { attempts: u32 },

    /// A debounced transition was published.
    MotionPublished(MotionEvent),

    /// A debounced transition could not be published (not retried).
    PublishFailed { status: MotionStatus, error: BrokerError },
}
