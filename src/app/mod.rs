//! Application core: pure domain logic, zero I/O.
//!
//! Debounce, publish and reconnect rules for the pirwatch device.  All
//! interaction with hardware and the network happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod connectivity;
pub mod events;
pub mod ports;
pub mod retry;
pub mod service;
