//! MQTT client adapter.
//!
//! Implements [`BrokerPort`] on top of the ESP-IDF MQTT client.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//!   The client's event stream is pumped on a small thread that mirrors
//!   CONNACK / disconnect into an `Arc<AtomicBool>` read by the main loop.
//! - **all other targets**: an in-memory broker for host-side tests.
//!
//! ## Sessions
//!
//! Every `connect()` builds a fresh client with a random id
//! (`ESP32Client-<hex>`), so a half-dead session never blocks a retry.
//! Publishes go out at QoS 0, non-retained.

use core::fmt::Write;

use log::info;

use crate::app::ports::BrokerPort;
use crate::config::DeviceConfig;
use crate::error::BrokerError;

#[cfg(target_os = "espidf")]
use std::sync::Arc;
#[cfg(target_os = "espidf")]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

/// Poll period while waiting for CONNACK.
#[cfg(target_os = "espidf")]
const CONNACK_POLL_MS: u32 = 50;

pub type ClientIdString = heapless::String<24>;

/// MQTT client id for one connection attempt.
pub fn client_id(suffix: u16) -> ClientIdString {
    let mut id = ClientIdString::new();
    let _ = write!(id, "ESP32Client-{:x}", suffix);
    id
}

/// Broker endpoint and credentials, copied out of [`DeviceConfig`].
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub url: String,
    pub username: String,
    pub password: String,
    pub connect_timeout_ms: u32,
}

impl MqttSettings {
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self {
            url: config.broker_url(),
            username: config.broker_username.clone(),
            password: config.broker_password.clone(),
            connect_timeout_ms: config.broker_connect_timeout_ms,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulated broker (host)
// ───────────────────────────────────────────────────────────────

/// In-memory stand-in for the broker, inspectable from tests.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimBroker {
    pub connected: bool,
    /// Upcoming `connect()` calls that will be refused.
    pub refuse_connects: u32,
    pub fail_publishes: bool,
    pub client_ids: Vec<String>,
    pub published: Vec<(String, String)>,
    pub polls: u32,
}

// ───────────────────────────────────────────────────────────────
// MQTT adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttAdapter {
    settings: MqttSettings,
    attempts: u32,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    connected: Arc<AtomicBool>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
    #[cfg(not(target_os = "espidf"))]
    sim_seed: u16,
}

impl MqttAdapter {
    pub fn new(settings: MqttSettings) -> Self {
        Self {
            settings,
            attempts: 0,
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            connected: Arc::new(AtomicBool::new(false)),
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker::default(),
            #[cfg(not(target_os = "espidf"))]
            sim_seed: 0xACE1,
        }
    }

    /// Connection attempts since boot.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim(&mut self) -> &mut SimBroker {
        &mut self.sim
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn random_suffix(&mut self) -> u16 {
        (unsafe { esp_idf_svc::sys::esp_random() }) as u16
    }

    /// Simulation: 16-bit Galois LFSR, deterministic per adapter.
    #[cfg(not(target_os = "espidf"))]
    fn random_suffix(&mut self) -> u16 {
        let lsb = self.sim_seed & 1;
        self.sim_seed >>= 1;
        if lsb != 0 {
            self.sim_seed ^= 0xB400;
        }
        self.sim_seed
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, id: &str) -> Result<(), BrokerError> {
        // Drop any stale session first; its event thread exits with it.
        self.client = None;

        let connected = Arc::new(AtomicBool::new(false));
        let refused = Arc::new(AtomicBool::new(false));

        let conf = MqttClientConfiguration {
            client_id: Some(id),
            username: non_empty(&self.settings.username),
            password: non_empty(&self.settings.password),
            ..Default::default()
        };
        let (client, mut connection) =
            EspMqttClient::new(&self.settings.url, &conf).map_err(|e| {
                log::warn!("MQTT: client init failed ({})", e);
                BrokerError::ClientInit
            })?;

        let session = connected.clone();
        let rejected = refused.clone();
        std::thread::Builder::new()
            .stack_size(6 * 1024)
            .spawn(move || {
                while let Ok(event) = connection.next() {
                    match event.payload() {
                        EventPayload::Connected(_) => session.store(true, Ordering::Release),
                        EventPayload::Disconnected => {
                            if !session.swap(false, Ordering::AcqRel) {
                                rejected.store(true, Ordering::Release);
                            }
                        }
                        EventPayload::Error(e) => log::debug!("MQTT: event error {:?}", e),
                        _ => {}
                    }
                }
                session.store(false, Ordering::Release);
            })
            .map_err(|_| BrokerError::ClientInit)?;

        let mut waited_ms = 0;
        while waited_ms < self.settings.connect_timeout_ms {
            if connected.load(Ordering::Acquire) {
                self.client = Some(client);
                self.connected = connected;
                return Ok(());
            }
            if refused.load(Ordering::Acquire) {
                return Err(BrokerError::ConnectRefused);
            }
            esp_idf_svc::hal::delay::FreeRtos::delay_ms(CONNACK_POLL_MS);
            waited_ms += CONNACK_POLL_MS;
        }
        Err(BrokerError::ConnectTimeout)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, id: &str) -> Result<(), BrokerError> {
        self.sim.client_ids.push(id.into());
        if self.sim.refuse_connects > 0 {
            self.sim.refuse_connects -= 1;
            return Err(BrokerError::ConnectRefused);
        }
        self.sim.connected = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.client.is_some() && self.connected.load(Ordering::Acquire)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim.connected
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let client = self.client.as_mut().ok_or(BrokerError::NotConnected)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|e| {
                log::warn!("MQTT: publish rejected by client ({})", e);
                BrokerError::PublishFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        if self.sim.fail_publishes {
            return Err(BrokerError::PublishFailed);
        }
        self.sim
            .published
            .push((topic.into(), String::from_utf8_lossy(payload).into_owned()));
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_poll(&mut self) {
        if self.client.is_some() && !self.connected.load(Ordering::Acquire) {
            log::warn!("MQTT: session lost");
            self.client = None;
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_poll(&mut self) {
        self.sim.polls = self.sim.polls.wrapping_add(1);
    }
}

#[cfg(target_os = "espidf")]
fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}

// ───────────────────────────────────────────────────────────────
// BrokerPort
// ───────────────────────────────────────────────────────────────

impl BrokerPort for MqttAdapter {
    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn connect(&mut self) -> Result<(), BrokerError> {
        self.attempts = self.attempts.wrapping_add(1);
        let suffix = self.random_suffix();
        let id = client_id(suffix);
        info!("MQTT: connecting to {} as '{}'", self.settings.url, id);
        self.platform_connect(id.as_str())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        if !self.platform_is_connected() {
            return Err(BrokerError::NotConnected);
        }
        self.platform_publish(topic, payload)?;
        info!("MQTT: published to '{}': {}", topic, String::from_utf8_lossy(payload));
        Ok(())
    }

    fn poll(&mut self) {
        self.platform_poll();
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
