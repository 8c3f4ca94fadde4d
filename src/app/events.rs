//! Outbound application events.
//!
//! The [`LightController`](super::controller::LightController) and the
//! runtime emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them: log to
//! serial, mirror to the cloud, drive the status LED.

use crate::fsm::StateId;
use crate::params::{ParameterError, PermanentStatus, ResourceId};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller has started (carries initial state).
    Started(StateId),

    /// The FSM moved between two different states.
    StateChanged { from: StateId, to: StateId },

    /// A parameter was committed to the store, from either side.
    ParameterChanged { id: ResourceId, value: i64 },

    /// One PIR edge was consumed; `count` is the new motion counter.
    MotionDetected { count: u64 },

    /// Motion edges lost because the ISR queue was full.
    MotionOverflow { dropped: u32 },

    /// A remote write was refused.
    RemoteWriteRejected { error: ParameterError },

    /// Cloud registration state changed.
    Registered,
    Unregistered,

    /// Periodic status snapshot.
    Status(LightStatus),
}

/// A point-in-time snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightStatus {
    pub state: StateId,
    /// Packed 0xRRGGBB, as stored.
    pub color: i64,
    pub timeout_secs: i64,
    pub permanent_status: PermanentStatus,
    pub motion_count: u64,
    pub motion_latch: bool,
    pub timer_armed: bool,
}
