//! Parameter store: the four remotely addressable light resources.
//!
//! ```text
//!  resource         path                     alias          access   notifies
//!  Color            led/0/color              3311/0/5706    RW       yes
//!  Timeout          led/0/timeout            3311/0/5853    RW       no
//!  PermanentStatus  led/0/permanent_status   3311/0/5850    RW       yes
//!  MotionCount      pir/0/count              3201/0/5700    RO       no
//! ```
//!
//! Values are plain integers, exactly as they travel over the parameter
//! protocol.  The store performs no range checking: whatever is written is
//! kept, and the typed accessors interpret it.  Remote and local writers go
//! through the same [`ParameterStore::write`].

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Identity of a parameter resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResourceId {
    Color = 0,
    Timeout = 1,
    PermanentStatus = 2,
    MotionCount = 3,
}

/// Who may write a resource over the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    ReadWrite,
    ReadOnly,
}

impl ResourceId {
    pub const COUNT: usize = 4;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Color,
        Self::Timeout,
        Self::PermanentStatus,
        Self::MotionCount,
    ];

    /// Human-readable path used when registering with the cloud.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Color => "led/0/color",
            Self::Timeout => "led/0/timeout",
            Self::PermanentStatus => "led/0/permanent_status",
            Self::MotionCount => "pir/0/count",
        }
    }

    /// Numeric object/instance/resource alias of [`path`](Self::path).
    pub const fn alias(self) -> &'static str {
        match self {
            Self::Color => "3311/0/5706",
            Self::Timeout => "3311/0/5853",
            Self::PermanentStatus => "3311/0/5850",
            Self::MotionCount => "3201/0/5700",
        }
    }

    pub const fn access(self) -> Access {
        match self {
            Self::MotionCount => Access::ReadOnly,
            _ => Access::ReadWrite,
        }
    }

    /// Resolve either spelling of a path.  A single leading `/` is accepted.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.strip_prefix('/').unwrap_or(path);
        Self::ALL
            .into_iter()
            .find(|id| id.path() == path || id.alias() == path)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// ───────────────────────────────────────────────────────────────
// Permanent status
// ───────────────────────────────────────────────────────────────

/// Remote override of motion-driven behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PermanentStatus {
    /// Defer to the motion sensor.
    #[default]
    None = 0,
    /// Always lit with the current colour.
    On = 1,
    /// Always dark.
    Off = 2,
}

impl PermanentStatus {
    /// Interpret a raw resource value.
    ///
    /// Only `1` and `2` name an override; anything else defers to motion,
    /// which is how the device has always treated unknown codes.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => Self::On,
            2 => Self::Off,
            _ => Self::None,
        }
    }

    pub const fn as_raw(self) -> i64 {
        self as i64
    }
}

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

/// Rejections on the remote write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    /// No resource lives at the given path.
    UnknownResource,
    /// The resource cannot be written over the network.
    ReadOnly(ResourceId),
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownResource => write!(f, "unknown resource"),
            Self::ReadOnly(id) => write!(f, "{} is read-only", id),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Store
// ───────────────────────────────────────────────────────────────

/// Notification produced by a write to a watched resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterChange {
    pub id: ResourceId,
    pub value: i64,
}

/// Initial values for a fresh store.
#[derive(Debug, Clone, Copy)]
pub struct ParameterDefaults {
    pub color: i64,
    pub timeout_secs: i64,
    pub permanent_status: PermanentStatus,
}

impl Default for ParameterDefaults {
    fn default() -> Self {
        Self {
            color: Color::GREEN.to_packed(),
            timeout_secs: 5,
            permanent_status: PermanentStatus::None,
        }
    }
}

/// The four light parameters plus their change watchers.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    values: [i64; ResourceId::COUNT],
    watched: [bool; ResourceId::COUNT],
}

impl ParameterStore {
    /// Fresh store with no watchers registered.
    pub fn new(defaults: ParameterDefaults) -> Self {
        let mut values = [0; ResourceId::COUNT];
        values[ResourceId::Color.index()] = defaults.color;
        values[ResourceId::Timeout.index()] = defaults.timeout_secs;
        values[ResourceId::PermanentStatus.index()] = defaults.permanent_status.as_raw();
        values[ResourceId::MotionCount.index()] = 0;
        Self {
            values,
            watched: [false; ResourceId::COUNT],
        }
    }

    /// Register a change watcher for `id`.
    pub fn watch(&mut self, id: ResourceId) {
        self.watched[id.index()] = true;
    }

    pub fn read(&self, id: ResourceId) -> i64 {
        self.values[id.index()]
    }

    /// Commit `value`, then return the notification for a watched resource.
    ///
    /// The caller must dispatch the returned change before issuing another
    /// write, which keeps every write+notify sequence atomic on the single
    /// cooperative path.
    #[must_use]
    pub fn write(&mut self, id: ResourceId, value: i64) -> Option<ParameterChange> {
        self.values[id.index()] = value;
        self.watched[id.index()].then_some(ParameterChange { id, value })
    }

    // ── Typed views ───────────────────────────────────────────

    pub fn color(&self) -> Color {
        Color::from_packed(self.read(ResourceId::Color))
    }

    pub fn timeout_secs(&self) -> i64 {
        self.read(ResourceId::Timeout)
    }

    pub fn permanent_status(&self) -> PermanentStatus {
        PermanentStatus::from_raw(self.read(ResourceId::PermanentStatus))
    }

    pub fn motion_count(&self) -> u64 {
        self.read(ResourceId::MotionCount).max(0) as u64
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(ParameterDefaults::default())
    }
}
