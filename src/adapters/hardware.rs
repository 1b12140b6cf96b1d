//! Hardware adapter bridging the PIR driver to the domain port trait.
//!
//! This is the only module in the system that touches the sensor GPIO.
//! On non-espidf targets the pin is whatever `InputPin` the caller hands in
//! (a mock in tests).

use embedded_hal::digital::InputPin;
use log::debug;

use crate::app::ports::MotionInputPort;
use crate::error::SensorError;
use crate::sensors::pir::PirSensor;

/// Concrete adapter that exposes the PIR sensor behind [`MotionInputPort`].
pub struct HardwareAdapter<P> {
    pir: PirSensor<P>,
}

impl<P: InputPin> HardwareAdapter<P> {
    pub fn new(pir: PirSensor<P>) -> Self {
        Self { pir }
    }

    pub fn pir(&self) -> &PirSensor<P> {
        &self.pir
    }
}

// ── MotionInputPort implementation ────────────────────────────

impl<P: InputPin> MotionInputPort for HardwareAdapter<P> {
    fn read_motion(&mut self) -> Result<bool, SensorError> {
        let reading = self.pir.read()?;
        if reading.edge {
            debug!("PIR: raw edge on GPIO{} → {}", self.pir.gpio(), u8::from(reading.motion));
        }
        Ok(reading.motion)
    }
}
