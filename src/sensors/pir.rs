//! HC-SR501 passive-infrared motion sensor.
//!
//! The module drives its output HIGH while it sees motion (plus its own
//! hold time) and LOW otherwise.  The pin is read through the
//! `embedded-hal` [`InputPin`] trait so the same driver works on an
//! ESP-IDF `PinDriver` and on a host-side mock.
//!
//! No filtering happens here: debouncing is a domain rule and lives in
//! [`MotionService`](crate::app::service::MotionService).

use embedded_hal::digital::{Error as _, InputPin};
use log::warn;

use crate::error::SensorError;

#[derive(Debug, Clone, Copy)]
pub struct PirReading {
    pub motion: bool,
    /// Raw level differs from the previous read.
    pub edge: bool,
}

pub struct PirSensor<P> {
    pin: P,
    gpio: i32,
    last_level: Option<bool>,
    edges: u32,
}

impl<P: InputPin> PirSensor<P> {
    pub fn new(pin: P, gpio: i32) -> Self {
        Self {
            pin,
            gpio,
            last_level: None,
            edges: 0,
        }
    }

    /// Sample the output level.
    pub fn read(&mut self) -> Result<PirReading, SensorError> {
        let motion = self.pin.is_high().map_err(|e| {
            warn!("PIR: GPIO{} read failed ({:?})", self.gpio, e.kind());
            SensorError::GpioReadFailed
        })?;
        let edge = self.last_level.is_some_and(|prev| prev != motion);
        if edge {
            self.edges = self.edges.wrapping_add(1);
        }
        self.last_level = Some(motion);
        Ok(PirReading { motion, edge })
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Raw (undebounced) level changes seen since boot.
    pub fn raw_edges(&self) -> u32 {
        self.edges
    }
}
