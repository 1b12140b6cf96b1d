//! Device identity.
//!
//! The id names the device in every payload and in its topic
//! (`sensors/{id}/events`), so it must be unique per board.  A build can
//! pin it with `PIRWATCH_DEVICE_ID`; otherwise it is derived from the
//! factory MAC as `ESP32_PIR_XXYYZZ` (last 3 bytes, uppercase hex), which
//! is stable across reboots.

use core::fmt::Write;

use log::info;

use crate::config::DeviceConfig;

/// Fixed-size device ID string: "ESP32_PIR_XXYYZZ" (16 chars).
pub type DeviceIdString = heapless::String<16>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Derive the device ID from the last 3 MAC bytes.
pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    let _ = write!(id, "ESP32_PIR_{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    id
}

/// Fill in `config.device_id` from the MAC when the build did not set one.
pub fn resolve(config: &mut DeviceConfig, mac: &MacAddress) {
    if config.device_id.is_empty() {
        config.device_id = device_id(mac).as_str().into();
        info!("Device ID derived from MAC: {}", config.device_id);
    } else {
        info!("Device ID: {}", config.device_id);
    }
}
