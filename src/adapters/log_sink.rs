//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { device_id, topic } => {
                info!("START | device={} | topic={}", device_id, topic);
            }
            AppEvent::NetworkUp { ip, attempts } => match ip {
                Some(ip) => info!("NET   | up | ip={} | attempts={}", ip, attempts),
                None => info!("NET   | up | ip=? | attempts={}", attempts),
            },
            AppEvent::BrokerConnected { attempts } => {
                info!("MQTT  | connected | attempts={}", attempts);
            }
            AppEvent::MotionPublished(e) => {
                info!("PUB   | {} | t={}ms", e.status, e.timestamp_device);
            }
            AppEvent::PublishFailed { status, error } => {
                warn!("PUB   | {} dropped | {}", status, error);
            }
        }
    }
}
