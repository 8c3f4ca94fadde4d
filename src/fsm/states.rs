//! Concrete state handler functions and table builder.
//!
//! Each state is three plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!            ┌──────[motion]──────┐
//!            ▼                    │
//!  IDLE ──[motion]──▶ MOTION_LIT ─┘
//!    ▲                    │
//!    └─────[expiry]───────┘
//!
//!  Any state ──[status On]───▶ FORCED_ON
//!  Any state ──[status Off]──▶ FORCED_OFF
//!  Any state ──[status None]─▶ IDLE
//! ```
//!
//! Motion counting is not a state concern; the controller bumps the
//! counter for every edge before dispatching.

use super::context::LightContext;
use super::{LightEvent, StateDescriptor, StateId};
use crate::params::PermanentStatus;
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_event: idle_event,
        },
        // Index 1: MotionLit
        StateDescriptor {
            id: StateId::MotionLit,
            name: "MotionLit",
            on_enter: Some(motion_lit_enter),
            on_exit: None,
            on_event: motion_lit_event,
        },
        // Index 2: ForcedOn
        StateDescriptor {
            id: StateId::ForcedOn,
            name: "ForcedOn",
            on_enter: Some(forced_on_enter),
            on_exit: None,
            on_event: forced_on_event,
        },
        // Index 3: ForcedOff
        StateDescriptor {
            id: StateId::ForcedOff,
            name: "ForcedOff",
            on_enter: Some(forced_off_enter),
            on_exit: None,
            on_event: forced_off_event,
        },
    ]
}

/// Target state for the current permanent status.
fn route_status(ctx: &LightContext) -> StateId {
    match ctx.params.status {
        PermanentStatus::On => StateId::ForcedOn,
        PermanentStatus::Off => StateId::ForcedOff,
        PermanentStatus::None => StateId::Idle,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE: sensor-driven, dark
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut LightContext) {
    ctx.motion_latch = false;
    ctx.extinguish();
    ctx.cancel_timer();
    info!("IDLE: light off, waiting for motion");
}

fn idle_event(ctx: &mut LightContext, event: LightEvent) -> Option<StateId> {
    match event {
        LightEvent::Motion => Some(StateId::MotionLit),
        LightEvent::StatusWritten => Some(route_status(ctx)),
        // Stored colour shows up on the next motion.
        LightEvent::ColorWritten => None,
        LightEvent::TimeoutExpired => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  MOTION_LIT: sensor-driven, lit until the timer expires
// ═══════════════════════════════════════════════════════════════════════════

fn motion_lit_enter(ctx: &mut LightContext) {
    ctx.motion_latch = true;
    ctx.light_up();
    ctx.arm_timer();
    debug!(
        "MOTION_LIT: lit for {}ms",
        ctx.params.timeout.as_millis()
    );
}

fn motion_lit_event(ctx: &mut LightContext, event: LightEvent) -> Option<StateId> {
    match event {
        // Re-entry re-applies the colour and pushes the deadline out.
        LightEvent::Motion => Some(StateId::MotionLit),
        LightEvent::TimeoutExpired => {
            info!("MOTION_LIT: no motion for {}ms", ctx.params.timeout.as_millis());
            Some(StateId::Idle)
        }
        LightEvent::ColorWritten => {
            ctx.light_up();
            None
        }
        LightEvent::StatusWritten => Some(route_status(ctx)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  FORCED_ON: permanently lit, motion ignored
// ═══════════════════════════════════════════════════════════════════════════

fn forced_on_enter(ctx: &mut LightContext) {
    ctx.light_up();
    info!("FORCED_ON: light held on");
}

fn forced_on_event(ctx: &mut LightContext, event: LightEvent) -> Option<StateId> {
    match event {
        LightEvent::ColorWritten => {
            ctx.light_up();
            None
        }
        LightEvent::StatusWritten => Some(route_status(ctx)),
        LightEvent::Motion | LightEvent::TimeoutExpired => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  FORCED_OFF: permanently dark, motion ignored
// ═══════════════════════════════════════════════════════════════════════════

fn forced_off_enter(ctx: &mut LightContext) {
    // Latch and pending timer are left alone; the expiry clears the latch.
    ctx.extinguish();
    info!("FORCED_OFF: light held off");
}

fn forced_off_event(ctx: &mut LightContext, event: LightEvent) -> Option<StateId> {
    match event {
        LightEvent::TimeoutExpired => {
            ctx.motion_latch = false;
            None
        }
        LightEvent::StatusWritten => Some(route_status(ctx)),
        LightEvent::Motion | LightEvent::ColorWritten => None,
    }
}
