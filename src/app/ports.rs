//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MotionService (domain)
//! ```
//!
//! Driven adapters (PIR input, clock, WiFi, MQTT, event sinks) implement
//! these traits.  The [`MotionService`](super::service::MotionService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.  Blocking waits go through [`embedded_hal::delay::DelayNs`].

use core::net::Ipv4Addr;

use crate::error::{BrokerError, ConnectivityError, SensorError};

// ───────────────────────────────────────────────────────────────
// Motion input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to sample the PIR output.
pub trait MotionInputPort {
    /// `true` when the sensor output is HIGH (motion present).
    fn read_motion(&mut self) -> Result<bool, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic device uptime.
pub trait ClockPort {
    /// Milliseconds since boot, truncated to `u32` (wraps after ~49 days).
    /// Consumers must compare with `wrapping_sub`.
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (WiFi station)
// ───────────────────────────────────────────────────────────────

pub trait ConnectivityPort {
    /// Store station credentials.  Validated before use.
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;

    /// Start or continue association.  Returns `Ok(())` once the link is up
    /// with an address, [`ConnectivityError::NotReady`] while it is still
    /// coming up.  Safe to call repeatedly.
    fn connect(&mut self) -> Result<(), ConnectivityError>;

    fn is_connected(&self) -> bool;

    fn disconnect(&mut self);

    /// Station IPv4 address, once assigned.
    fn local_ip(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Broker port (MQTT client)
// ───────────────────────────────────────────────────────────────

pub trait BrokerPort {
    fn is_connected(&self) -> bool;

    /// One connection attempt.  Implementations pick a fresh client id per
    /// attempt and block at most for their configured connect timeout.
    fn connect(&mut self) -> Result<(), BrokerError>;

    /// Publish once at QoS 0, non-retained.  No acknowledgement is awaited.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError>;

    /// Service the client between publishes (keep-alive, inbound traffic).
    fn poll(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
