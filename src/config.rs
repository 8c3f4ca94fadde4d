//! System configuration parameters
//!
//! Board topology, factory defaults for the light parameters, and the
//! cloud/network identity.  Persisted in NVS with postcard; see
//! [`NvsAdapter`](crate::adapters::nvs::NvsAdapter).
//!
//! `validate` only covers what the board needs to boot.  The remotely
//! writable light parameters are deliberately stored unvalidated by
//! [`ParameterStore`](crate::params::ParameterStore).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::params::{ParameterDefaults, PermanentStatus};

pub type EndpointName = heapless::String<32>;
pub type Ssid = heapless::String<32>;
pub type Password = heapless::String<64>;
/// `host:port` of the device-management server.
pub type ServerAddr = heapless::String<64>;

// Network identity is baked in at build time; a config saved in NVS
// overrides it.  Device builds refuse to compile without it.
#[cfg(target_os = "espidf")]
const BUILD_WIFI_SSID: &str = env!("WIFI_SSID");
#[cfg(target_os = "espidf")]
const BUILD_WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");
#[cfg(target_os = "espidf")]
const BUILD_CLOUD_SERVER: &str = env!("CLOUD_SERVER");

#[cfg(not(target_os = "espidf"))]
const BUILD_WIFI_SSID: &str = match option_env!("WIFI_SSID") {
    Some(ssid) => ssid,
    None => "light-lab",
};
#[cfg(not(target_os = "espidf"))]
const BUILD_WIFI_PASSWORD: &str = match option_env!("WIFI_PASSWORD") {
    Some(password) => password,
    None => "light-lab-pass",
};
#[cfg(not(target_os = "espidf"))]
const BUILD_CLOUD_SERVER: &str = match option_env!("CLOUD_SERVER") {
    Some(addr) => addr,
    None => "127.0.0.1:5690",
};

/// Wiring of a tricolor LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Polarity {
    /// Shared cathode: duty = intensity.
    #[default]
    CommonCathode,
    /// Shared anode: duty = 1 - intensity.
    CommonAnode,
}

/// Which light source is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedKind {
    /// Three PWM channels.
    Tricolor { polarity: Polarity },
    /// Grove chainable RGB module (P9813), one module.
    Chainable,
    /// Grove 10-segment LED bar (MY9221); red channel sets the level.
    LedBar,
}

impl Default for LedKind {
    fn default() -> Self {
        Self::Tricolor {
            polarity: Polarity::CommonCathode,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Light parameter defaults ---
    /// Packed 0xRRGGBB colour at boot
    pub default_color: u32,
    /// Auto-off delay at boot (seconds)
    pub default_timeout_secs: u32,

    // --- Hardware ---
    pub led: LedKind,
    /// LEDC frequency for tricolor PWM (Hz)
    pub pwm_frequency_hz: u32,

    // --- Cloud ---
    /// Name the device registers under
    pub endpoint_name: EndpointName,
    /// Registration keep-alive interval (seconds)
    pub keep_alive_interval_secs: u32,
    pub cloud_server: ServerAddr,

    // --- Network ---
    pub wifi_ssid: Ssid,
    pub wifi_password: Password,

    // --- Timing ---
    /// Cooperative loop poll period (milliseconds)
    pub loop_interval_ms: u32,
}

/// Advertised at registration.
pub const DEVICE_TYPE: &str = "light-system";

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            default_color: 0x00FF00, // green
            default_timeout_secs: 5,

            led: LedKind::default(),
            pwm_frequency_hz: 5_000,

            endpoint_name: truncated("light-system"),
            keep_alive_interval_secs: 25,
            cloud_server: truncated(BUILD_CLOUD_SERVER),

            wifi_ssid: truncated(BUILD_WIFI_SSID),
            wifi_password: truncated(BUILD_WIFI_PASSWORD),

            loop_interval_ms: 10, // 100 Hz
        }
    }
}

impl SystemConfig {
    /// Initial values for the parameter store.
    pub fn parameter_defaults(&self) -> ParameterDefaults {
        ParameterDefaults {
            color: i64::from(self.default_color),
            timeout_secs: i64::from(self.default_timeout_secs),
            permanent_status: PermanentStatus::None,
        }
    }

    /// Range-check the boot configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_color > 0xFF_FFFF {
            return Err(ConfigError::ValidationFailed(
                "default_color must fit in 0xRRGGBB",
            ));
        }
        if self.default_timeout_secs > 86_400 {
            return Err(ConfigError::ValidationFailed(
                "default_timeout_secs must be 0-86400",
            ));
        }
        if !(100..=40_000).contains(&self.pwm_frequency_hz) {
            return Err(ConfigError::ValidationFailed(
                "pwm_frequency_hz must be 100-40000",
            ));
        }
        if self.endpoint_name.is_empty() {
            return Err(ConfigError::ValidationFailed("endpoint_name is empty"));
        }
        if self.cloud_server.is_empty() {
            return Err(ConfigError::ValidationFailed("cloud_server is empty"));
        }
        if self.wifi_ssid.is_empty() {
            return Err(ConfigError::ValidationFailed("wifi_ssid is empty"));
        }
        if !(1..=3600).contains(&self.keep_alive_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "keep_alive_interval_secs must be 1-3600",
            ));
        }
        if !(1..=1000).contains(&self.loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "loop_interval_ms must be 1-1000",
            ));
        }
        Ok(())
    }
}

/// Copy as much of `s` as fits, stopping on a char boundary.
pub fn truncated<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
