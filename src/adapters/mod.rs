//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                   |
//! |------------|--------------------|-------------------------------|
//! | `cloud`    | CloudPort          | Device-management client task |
//! | `cloud_task` | (network thread) | Device-management server, TCP |
//! | `hardware` | ActuatorPort       | LEDC PWM / Grove GPIO lines   |
//! | `log_sink` | EventSink          | Serial log output             |
//! | `nvs`      | ConfigPort         | NVS / in-memory store         |
//! | `time`     | (monotonic clock)  | ESP32 high-resolution timer   |
//! | `wifi`     | ConnectivityPort   | ESP-IDF WiFi STA              |

pub mod cloud;
pub mod cloud_task;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod wifi;
