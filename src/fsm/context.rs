//! Shared mutable context threaded through every FSM handler.
//!
//! `LightContext` is the blackboard the state handlers read from and write
//! to.  The controller refreshes the parameter snapshot before each
//! dispatch and applies the resulting commands afterwards, so handlers
//! never touch the store, the timer or the hardware directly.

use embassy_time::Duration;

use crate::color::Color;
use crate::params::{ParameterStore, PermanentStatus};
use crate::scheduler::timeout_duration;

// ---------------------------------------------------------------------------
// Parameter snapshot (read-only to state handlers; written by the controller)
// ---------------------------------------------------------------------------

/// Point-in-time view of the parameters the policy depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    pub color: Color,
    /// Auto-off delay, already converted from the raw resource value.
    pub timeout: Duration,
    pub status: PermanentStatus,
}

impl ParameterSnapshot {
    pub fn from_store(store: &ParameterStore) -> Self {
        Self {
            color: store.color(),
            timeout: timeout_duration(store.timeout_secs()),
            status: store.permanent_status(),
        }
    }
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self::from_store(&ParameterStore::default())
    }
}

// ---------------------------------------------------------------------------
// Commands (written by state handlers; consumed by the controller)
// ---------------------------------------------------------------------------

/// Request for the timeout scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Arm (or re-arm) for the given delay from now.
    Arm(Duration),
    Cancel,
}

/// Outputs of one dispatch.  The last write to a field wins, so an exit
/// action followed by an enter action collapses into a single command.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightCommands {
    /// Colour to push to the actuator, if it should change.
    pub apply: Option<Color>,
    pub timer: Option<TimerCommand>,
}

impl LightCommands {
    pub fn is_empty(&self) -> bool {
        self.apply.is_none() && self.timer.is_none()
    }
}

// ---------------------------------------------------------------------------
// LightContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
#[derive(Debug, Default)]
pub struct LightContext {
    /// Latest parameter values.  Refreshed before each dispatch.
    pub params: ParameterSnapshot,

    /// True between a motion-triggered light-up and the following expiry
    /// or `None` status write.
    pub motion_latch: bool,

    /// Commands to be applied after the dispatch.
    pub commands: LightCommands,
}

impl LightContext {
    pub fn new(params: ParameterSnapshot) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Request the current colour on the actuator.
    pub fn light_up(&mut self) {
        self.commands.apply = Some(self.params.color);
    }

    /// Request all channels off.
    pub fn extinguish(&mut self) {
        self.commands.apply = Some(Color::OFF);
    }

    pub fn arm_timer(&mut self) {
        self.commands.timer = Some(TimerCommand::Arm(self.params.timeout));
    }

    pub fn cancel_timer(&mut self) {
        self.commands.timer = Some(TimerCommand::Cancel);
    }

    /// Hand the accumulated commands to the caller and reset them.
    pub fn take_commands(&mut self) -> LightCommands {
        core::mem::take(&mut self.commands)
    }
}
