//! Sensor drivers.

pub mod pir;
