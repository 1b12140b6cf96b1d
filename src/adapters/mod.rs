//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to              |
//! |-------------|--------------------|--------------------------|
//! | `device_id` | -                  | eFuse factory MAC        |
//! | `hardware`  | MotionInputPort    | PIR GPIO (embedded-hal)  |
//! | `log_sink`  | EventSink          | Serial log output        |
//! | `mqtt`      | BrokerPort         | ESP-IDF MQTT client      |
//! | `time`      | ClockPort, DelayNs | ESP32 system timer       |
//! | `wifi`      | ConnectivityPort   | ESP-IDF WiFi STA         |

pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub mod wifi;
