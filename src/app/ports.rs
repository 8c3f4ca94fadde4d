//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LightController (domain)
//! ```
//!
//! Driven adapters (light drivers, event sinks, storage, cloud client)
//! implement these traits.  The
//! [`LightController`](super::controller::LightController) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::color::Color;
use crate::config::SystemConfig;
use crate::params::ResourceId;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the light source.
///
/// Channels are normalized to `0.0..=1.0`.  Implementations clamp anything
/// outside that range and never report failure to the caller; a driver
/// that cannot reach its hardware logs and carries on.
pub trait ActuatorPort {
    fn set_color(&mut self, color: Color);

    /// All channels off.
    fn off(&mut self) {
        self.set_color(Color::OFF);
    }
}

impl<T: ActuatorPort + ?Sized> ActuatorPort for Box<T> {
    fn set_color(&mut self, color: Color) {
        (**self).set_color(color);
    }
}

impl<T: ActuatorPort + ?Sized> ActuatorPort for &mut T {
    fn set_color(&mut self, color: Color) {
        (**self).set_color(color);
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, cloud
/// mirror, status LED).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn emit(&mut self, event: &super::events::AppEvent) {
        (**self).emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Cloud port (driven adapter: domain ↔ device-management client)
// ───────────────────────────────────────────────────────────────

/// Something the cloud client reports back to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudEvent {
    /// The server accepted our registration.
    Registered,
    /// Registration lapsed (keep-alive missed, server restart).
    Unregistered,
    /// A remote PUT.  The path is passed through unresolved.
    RemoteWrite {
        path: heapless::String<CLOUD_PATH_MAX>,
        value: i64,
    },
}

/// Longest resource path accepted from the network.
pub const CLOUD_PATH_MAX: usize = 32;

/// Device-management client.
///
/// The protocol itself lives outside the firmware; this port only covers
/// what the light needs from it.
pub trait CloudPort {
    /// Publish a resource with its initial value.  Startup only.
    fn define_resource(&mut self, id: ResourceId, value: i64) -> Result<(), CloudError>;

    /// Last value mirrored for `id`, as a remote GET would see it.
    fn read(&self, id: ResourceId) -> Option<i64>;

    /// Mirror a local value so remote observers see it.
    fn write(&mut self, id: ResourceId, value: i64) -> Result<(), CloudError>;

    /// Next pending notification from the client, if any.
    fn poll(&mut self) -> Option<CloudEvent>;

    /// Tell the server we are still here.
    fn keep_alive(&mut self) -> Result<(), CloudError>;

    fn is_registered(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations validate before persisting and reject invalid ranges
/// with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`CloudPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudError {
    /// Resource registry is full.
    RegistryFull,
    /// The resource was never defined.
    UndefinedResource(ResourceId),
    /// The resource was defined twice.
    DuplicateResource(ResourceId),
    /// Outbound queue towards the network task is full.
    QueueFull,
    /// Not registered with the server.
    NotRegistered,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for CloudError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RegistryFull => write!(f, "resource registry full"),
            Self::UndefinedResource(id) => write!(f, "{} not defined", id),
            Self::DuplicateResource(id) => write!(f, "{} defined twice", id),
            Self::QueueFull => write!(f, "outbound queue full"),
            Self::NotRegistered => write!(f, "not registered"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
