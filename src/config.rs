//! Device configuration parameters
//!
//! All tunable parameters for the pirwatch device.  Credentials and broker
//! settings are baked in at build time from `PIRWATCH_*` environment
//! variables; timing values are fixed defaults.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::pins;

/// Topic layout: `sensors/{device_id}/events`.
pub const TOPIC_PREFIX: &str = "sensors/";
pub const TOPIC_SUFFIX: &str = "/events";
/// Longest topic the publish path accepts.
pub const MAX_TOPIC_LEN: usize = 59;
/// Longest device id that still yields a topic within [`MAX_TOPIC_LEN`].
pub const MAX_DEVICE_ID_LEN: usize = MAX_TOPIC_LEN - TOPIC_PREFIX.len() - TOPIC_SUFFIX.len();

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// How a blocking connect loop waits between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt.
    pub initial_delay_ms: u32,
    /// Upper bound on any single delay.
    pub max_delay_ms: u32,
    /// Growth factor applied per failed attempt (1 = fixed delay).
    pub multiplier: u32,
    /// Give up after this many attempts.  `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Same delay after every failure, never give up.
    pub const fn fixed(delay_ms: u32) -> Self {
        Self {
            initial_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
            multiplier: 1,
            max_attempts: None,
        }
    }

    /// Doubling delay from `initial_ms`, capped at `max_ms`, never give up.
    pub const fn backoff(initial_ms: u32, max_ms: u32) -> Self {
        Self {
            initial_delay_ms: initial_ms,
            max_delay_ms: max_ms,
            multiplier: 2,
            max_attempts: None,
        }
    }

    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> u32 {
        let mut delay = self.initial_delay_ms;
        if self.multiplier > 1 {
            for _ in 1..attempt {
                if delay == 0 || delay >= self.max_delay_ms {
                    break;
                }
                delay = delay.saturating_mul(self.multiplier);
            }
        }
        delay.min(self.max_delay_ms)
    }

    /// Whether another attempt is allowed after `attempts` failures.
    pub fn allows_retry(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }
}

// ---------------------------------------------------------------------------
// Device configuration
// ---------------------------------------------------------------------------

/// Core device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    // --- WiFi ---
    pub wifi_ssid: String,
    /// Empty for an open network.
    pub wifi_password: String,

    // --- MQTT broker ---
    pub broker_host: String,
    pub broker_port: u16,
    /// Empty for anonymous sessions.
    pub broker_username: String,
    pub broker_password: String,
    /// How long a single connect attempt waits for the broker's CONNACK.
    pub broker_connect_timeout_ms: u32,

    // --- Identity ---
    /// Empty means "derive from the factory MAC".
    pub device_id: String,

    // --- Sensor ---
    pub pir_gpio: i32,
    /// Minimum dwell (ms) between accepted transitions.
    pub debounce_ms: u32,
    /// Polling loop period (ms).
    pub poll_interval_ms: u32,

    // --- Retry ---
    pub wifi_retry: RetryPolicy,
    pub broker_retry: RetryPolicy,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: env_or(option_env!("PIRWATCH_WIFI_SSID"), ""),
            wifi_password: env_or(option_env!("PIRWATCH_WIFI_PASSWORD"), ""),

            broker_host: env_or(option_env!("PIRWATCH_BROKER_HOST"), "broker.hivemq.com"),
            broker_port: option_env!("PIRWATCH_BROKER_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(1883),
            broker_username: env_or(option_env!("PIRWATCH_BROKER_USERNAME"), ""),
            broker_password: env_or(option_env!("PIRWATCH_BROKER_PASSWORD"), ""),
            broker_connect_timeout_ms: 5000,

            device_id: env_or(option_env!("PIRWATCH_DEVICE_ID"), ""),

            pir_gpio: pins::PIR_GPIO,
            debounce_ms: 500,
            poll_interval_ms: 100, // 10 Hz

            wifi_retry: RetryPolicy::fixed(500),
            broker_retry: RetryPolicy::fixed(5000),
        }
    }
}

fn env_or(value: Option<&str>, fallback: &str) -> String {
    value.unwrap_or(fallback).into()
}

impl DeviceConfig {
    /// MQTT topic events are published to.
    pub fn topic(&self) -> String {
        format!("{TOPIC_PREFIX}{}{TOPIC_SUFFIX}", self.device_id)
    }

    /// Broker URL understood by the ESP-IDF MQTT client.
    pub fn broker_url(&self) -> String {
        format!("mqtt://{}:{}", self.broker_host, self.broker_port)
    }

    /// Reject configurations the device cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ssid(&self.wifi_ssid)?;
        validate_password(&self.wifi_password)?;
        if self.broker_host.is_empty() || !is_printable_ascii(&self.broker_host) {
            return Err(ConfigError::InvalidBrokerHost);
        }
        if self.broker_port == 0 {
            return Err(ConfigError::InvalidBrokerPort);
        }
        validate_device_id(&self.device_id)?;
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Errors from [`DeviceConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    InvalidSsid,
    InvalidPassword,
    InvalidBrokerHost,
    InvalidBrokerPort,
    InvalidDeviceId,
    InvalidPollInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID must be 1-32 printable ASCII bytes"),
            Self::InvalidPassword => write!(f, "WiFi password must be empty or 8-64 bytes"),
            Self::InvalidBrokerHost => write!(f, "broker host must be non-empty printable ASCII"),
            Self::InvalidBrokerPort => write!(f, "broker port must be non-zero"),
            Self::InvalidDeviceId => write!(
                f,
                "device id must be 1-{MAX_DEVICE_ID_LEN} printable ASCII bytes without '/', '+' or '#'"
            ),
            Self::InvalidPollInterval => write!(f, "poll interval must be non-zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Returns `true` if every byte of `s` is in the printable ASCII range
/// `0x20..=0x7E`.
pub(crate) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub(crate) fn validate_ssid(ssid: &str) -> Result<(), ConfigError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConfigError::InvalidSsid);
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<(), ConfigError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConfigError::InvalidPassword);
    }
    Ok(())
}

pub(crate) fn validate_device_id(id: &str) -> Result<(), ConfigError> {
    if id.is_empty() || id.len() > MAX_DEVICE_ID_LEN || !is_printable_ascii(id) {
        return Err(ConfigError::InvalidDeviceId);
    }
    if id.contains(['/', '+', '#']) {
        return Err(ConfigError::InvalidDeviceId);
    }
    Ok(())
}
