//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the hexagonal boundary for network
//! connectivity.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Association
//!
//! `connect()` is non-blocking: the first call configures the driver and
//! starts association, later calls report whether the link (and DHCP
//! lease) is up.  The blocking wait lives in
//! [`bring_up_network`](crate::app::connectivity::bring_up_network).  If
//! the link does not come up within [`REASSOCIATE_AFTER`] polls the
//! association is re-issued, so a dropped attempt never wedges bring-up.

use core::net::Ipv4Addr;

use log::info;

use crate::app::ports::ConnectivityPort;
use crate::config::{validate_password, validate_ssid};
use crate::error::ConnectivityError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

/// Polls without a link before association is started again.
pub const REASSOCIATE_AFTER: u32 = 20;

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Associating { polls: u32 },
    Connected,
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    #[cfg(target_os = "espidf")]
    driver: Option<EspWifi<'static>>,
    /// Simulation: `connect()` calls that report NotReady before the link comes up.
    #[cfg(not(target_os = "espidf"))]
    sim_link_delay: u32,
    /// Simulation: counts association requests issued to the "driver".
    #[cfg(not(target_os = "espidf"))]
    sim_associations: u32,
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            #[cfg(target_os = "espidf")]
            driver: None,
            #[cfg(not(target_os = "espidf"))]
            sim_link_delay: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_associations: 0,
        }
    }

    /// Hand the adapter the ESP-IDF driver (built in `main` where the modem
    /// peripheral is owned).
    #[cfg(target_os = "espidf")]
    pub fn with_driver(mut self, driver: EspWifi<'static>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Simulation: make the link take `polls` extra `connect()` calls.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_link_delay(&mut self, polls: u32) {
        self.sim_link_delay = polls;
    }

    /// Simulation: association requests issued so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_associations(&self) -> u32 {
        self.sim_associations
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_associate(&mut self) -> Result<(), ConnectivityError> {
        let Some(wifi) = self.driver.as_mut() else {
            log::warn!("WiFi: no driver attached");
            return Err(ConnectivityError::ConnectionFailed);
        };

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        wifi.set_configuration(&conf).map_err(|e| {
            log::warn!("WiFi: set_configuration failed ({})", e);
            ConnectivityError::ConnectionFailed
        })?;
        if !wifi.is_started().unwrap_or(false) {
            wifi.start().map_err(|e| {
                log::warn!("WiFi: start failed ({})", e);
                ConnectivityError::ConnectionFailed
            })?;
        }
        wifi.connect().map_err(|e| {
            log::warn!("WiFi: connect request failed ({})", e);
            ConnectivityError::ConnectionFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_associate(&mut self) -> Result<(), ConnectivityError> {
        self.sim_associations = self.sim_associations.wrapping_add(1);
        info!("WiFi(sim): associating with '{}'", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_link_up(&mut self, _polls: u32) -> bool {
        self.driver.as_ref().is_some_and(|wifi| {
            wifi.is_connected().unwrap_or(false) && wifi.sta_netif().is_up().unwrap_or(false)
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_link_up(&mut self, polls: u32) -> bool {
        polls >= self.sim_link_delay
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Some(wifi) = self.driver.as_mut() {
            if let Err(e) = wifi.disconnect() {
                log::warn!("WiFi: disconnect failed ({})", e);
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): disconnected");
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|wifi| wifi.is_connected().unwrap_or(false))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_ip(&self) -> Option<Ipv4Addr> {
        let wifi = self.driver.as_ref()?;
        wifi.sta_netif().get_ip_info().ok().map(|info| info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_ip(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(192, 168, 4, 2))
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        validate_password(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }

        let polls = match self.state {
            WifiState::Connected if self.platform_is_connected() => return Ok(()),
            WifiState::Associating { polls } if polls < REASSOCIATE_AFTER => polls + 1,
            _ => {
                if let Err(e) = self.platform_associate() {
                    self.state = WifiState::Disconnected;
                    return Err(e);
                }
                0
            }
        };

        if self.platform_link_up(polls) {
            self.state = WifiState::Connected;
            info!("WiFi: link up (IP={:?})", self.platform_ip());
            Ok(())
        } else {
            self.state = WifiState::Associating { polls };
            Err(ConnectivityError::NotReady)
        }
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_is_connected()
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        info!("WiFi: disconnected");
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        if self.is_connected() { self.platform_ip() } else { None }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
