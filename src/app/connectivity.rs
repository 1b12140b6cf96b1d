//! Network bring-up and broker reconnect-on-demand.
//!
//! Both block the caller until the link is usable, sleeping per the
//! configured [`RetryPolicy`] between attempts.  With the default (fixed,
//! unbounded) policies neither function gives up; a bounded policy surfaces
//! the last attempt's error.

use embedded_hal::delay::DelayNs;
use log::info;

use crate::config::RetryPolicy;
use crate::error::Result;

use super::events::AppEvent;
use super::ports::{BrokerPort, ConnectivityPort, EventSink};
use super::retry::{RetryError, retry};

fn last_error<E>(e: RetryError<E>) -> E {
    match e {
        RetryError::Exhausted { last, .. } => last,
    }
}

/// Configure station credentials and block until the WiFi link is up.
pub fn bring_up_network(
    wifi: &mut impl ConnectivityPort,
    ssid: &str,
    password: &str,
    policy: &RetryPolicy,
    delay: &mut impl DelayNs,
    sink: &mut impl EventSink,
) -> Result<u32> {
    wifi.set_credentials(ssid, password)?;

    info!("WiFi: connecting to '{}'", ssid);
    let ((), attempts) = retry(policy, delay, "WiFi", |_| wifi.connect()).map_err(last_error)?;

    let ip = wifi.local_ip();
    match ip {
        Some(addr) => info!("WiFi: connected, IP address {}", addr),
        None => info!("WiFi: connected"),
    }
    sink.emit(&AppEvent::NetworkUp { ip, attempts });
    Ok(attempts)
}

/// Make sure a broker session exists, reconnecting until one does.
///
/// Returns the number of connect attempts made (0 if already connected).
pub fn ensure_broker(
    broker: &mut impl BrokerPort,
    policy: &RetryPolicy,
    delay: &mut impl DelayNs,
    sink: &mut impl EventSink,
) -> Result<u32> {
    if broker.is_connected() {
        return Ok(0);
    }

    info!("MQTT: attempting connection");
    let ((), attempts) = retry(policy, delay, "MQTT", |_| broker.connect()).map_err(last_error)?;
    info!("MQTT: connected after {} attempt(s)", attempts);
    sink.emit(&AppEvent::BrokerConnected { attempts });
    Ok(attempts)
}
